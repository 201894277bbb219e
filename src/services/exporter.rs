//! 文档导出服务 - 业务能力层
//!
//! 把题目集合渲染为 naskah（试卷正文 + 答案与解析表）和
//! kisi-kisi（命题蓝图表）两种 HTML 文档，写成 Word 能直接
//! 打开的 .doc 文件。PDF 渲染不在本服务范围内。

use std::path::Path;

use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::answer::index_to_letter;
use crate::models::qtype::QuestionType;
use crate::models::question::Question;

/// 导出 naskah 文档；空集合为无操作
pub async fn export_naskah_doc(questions: &[Question], path: &Path) -> AppResult<()> {
    if questions.is_empty() {
        debug!("题目集合为空，跳过 naskah 导出");
        return Ok(());
    }

    let html = wrap_word_document("Naskah Soal", &build_naskah_html(questions));
    write_doc(path, &html).await
}

/// 导出 kisi-kisi 文档；空集合为无操作
pub async fn export_kisi_kisi_doc(questions: &[Question], path: &Path) -> AppResult<()> {
    if questions.is_empty() {
        debug!("题目集合为空，跳过 kisi-kisi 导出");
        return Ok(());
    }

    let html = wrap_word_document("Kisi-kisi", &build_kisi_kisi_html(questions));
    write_doc(path, &html).await
}

/// 文件名里不能出现的字符替换掉（科目名直接进文件名）
pub fn safe_file_stem(subject: &str) -> String {
    let cleaned: String = subject
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "Soal".to_string()
    } else {
        cleaned.split_whitespace().collect::<Vec<_>>().join("_")
    }
}

/// 渲染试卷正文 HTML
pub fn build_naskah_html(questions: &[Question]) -> String {
    let first = &questions[0];
    let mut html = String::new();

    html.push_str(&format!(
        r#"<div style="font-family: 'Times New Roman', serif; padding: 50px; color: black; background: white; line-height: 1.6;">
<div style="text-align: center; font-weight: bold; font-size: 16pt; text-transform: uppercase;">NASKAH SOAL UJIAN</div>
<div style="text-align: center; font-weight: bold; font-size: 14pt; margin-bottom: 25px;">MATA PELAJARAN: {}</div>
<table style="width: 100%; margin-bottom: 25px; font-size: 11pt;">
<tr><td style="width: 20%;">Mata Pelajaran</td><td style="width: 2%;">:</td><td>{}</td></tr>
<tr><td>Fase / Kelas</td><td>:</td><td>{}</td></tr>
<tr><td>Token Paket</td><td>:</td><td>{}</td></tr>
<tr><td>Waktu</td><td>:</td><td>.......... Menit</td></tr>
</table>
<hr style="border: 1px solid black; margin-bottom: 30px;" />
"#,
        first.subject, first.subject, first.phase, first.quiz_token
    ));

    // 相邻题目共用的阅读材料只打印一次（按内容完全相等分组）
    let mut previous_stimulus: Option<&str> = None;

    for (index, question) in questions.iter().enumerate() {
        html.push_str("<div style=\"margin-bottom: 40px;\">\n");

        if let Some(stimulus) = question.stimulus_text.as_deref() {
            if previous_stimulus != Some(stimulus) {
                html.push_str(&format!(
                    "<div style=\"border: 1px solid #999; padding: 12px; margin-bottom: 15px; font-style: italic;\">{}</div>\n",
                    stimulus
                ));
            }
        }
        previous_stimulus = question.stimulus_text.as_deref();

        html.push_str(&format!(
            "<div style=\"font-weight: bold; font-size: 12pt;\">{}. {}</div>\n",
            index + 1,
            question.text
        ));

        match question.qtype {
            QuestionType::Mcma | QuestionType::Kompleks => {
                html.push_str(
                    "<div style=\"color: #d11; font-style: italic; font-size: 10pt;\">(Jawaban bisa lebih dari satu)</div>\n",
                );
            }
            QuestionType::BenarSalah | QuestionType::SesuaiTidakSesuai => {
                let (truthy, falsy) = question
                    .tf_labels
                    .as_ref()
                    .map(|l| (l.truthy.as_str(), l.falsy.as_str()))
                    .unwrap_or(("Benar", "Salah"));
                html.push_str(&format!(
                    "<div style=\"color: #d11; font-style: italic; font-size: 10pt;\">(Tentukan {} atau {} pada setiap pernyataan)</div>\n",
                    truthy, falsy
                ));
            }
            _ => {}
        }

        if let Some(image) = &question.image {
            html.push_str(&format!(
                "<div style=\"margin: 15px 0;\"><img src=\"{}\" style=\"max-width: 100%;\" /></div>\n",
                image
            ));
        }

        if question.qtype.is_table() {
            let (truthy, falsy) = question
                .tf_labels
                .as_ref()
                .map(|l| (l.truthy.as_str(), l.falsy.as_str()))
                .unwrap_or(("B", "S"));
            html.push_str(&format!(
                "<table style=\"width: 100%; border-collapse: collapse; margin-top: 10px; font-size: 11pt;\">\n<tr><th style=\"border: 1px solid black; padding: 5px;\">No</th><th style=\"border: 1px solid black; padding: 5px;\">Pernyataan</th><th style=\"border: 1px solid black; padding: 5px;\">{}</th><th style=\"border: 1px solid black; padding: 5px;\">{}</th></tr>\n",
                truthy, falsy
            ));
            for (i, option) in question.options.iter().enumerate() {
                html.push_str(&format!(
                    "<tr><td style=\"border: 1px solid black; padding: 5px; text-align: center;\">{}</td><td style=\"border: 1px solid black; padding: 5px;\">{}</td><td style=\"border: 1px solid black; padding: 5px;\"></td><td style=\"border: 1px solid black; padding: 5px;\"></td></tr>\n",
                    i + 1,
                    option
                ));
            }
            html.push_str("</table>\n");
        } else if question.qtype.has_options() {
            for (i, option) in question.options.iter().enumerate() {
                html.push_str(&format!(
                    "<div style=\"margin: 6px 0 6px 10px;\"><b>{}.</b> {}",
                    index_to_letter(i),
                    option
                ));
                if let Some(Some(image)) = question
                    .option_images
                    .as_ref()
                    .and_then(|imgs| imgs.get(i))
                    .map(|img| img.as_deref())
                {
                    html.push_str(&format!(
                        "<div><img src=\"{}\" style=\"max-width: 200px;\" /></div>",
                        image
                    ));
                }
                html.push_str("</div>\n");
            }
        }

        html.push_str("</div>\n");
    }

    // 答案与解析表
    html.push_str(
        r#"<div style="margin-top: 50px; border-top: 2px dashed #666; padding-top: 40px;">
<div style="text-align: center; font-weight: bold; font-size: 14pt; text-decoration: underline; margin-bottom: 25px;">KUNCI JAWABAN &amp; PEMBAHASAN</div>
<table style="width: 100%; border-collapse: collapse; border: 1.5pt solid black;">
<tr style="background-color: #f2f2f2;"><th style="border: 1.5pt solid black; padding: 12px;">No</th><th style="border: 1.5pt solid black; padding: 12px;">Kunci</th><th style="border: 1.5pt solid black; padding: 12px;">Pembahasan</th></tr>
"#,
    );

    for (index, question) in questions.iter().enumerate() {
        let key = question
            .correct_answer
            .to_export_string(question.tf_labels.as_ref());
        let explanation = if question.explanation.is_empty() {
            "-"
        } else {
            &question.explanation
        };
        html.push_str(&format!(
            "<tr><td style=\"border: 1pt solid black; padding: 10px; text-align: center;\">{}</td><td style=\"border: 1pt solid black; padding: 10px; text-align: center; font-weight: bold;\">{}</td><td style=\"border: 1pt solid black; padding: 10px; font-size: 10pt;\">{}</td></tr>\n",
            index + 1,
            key,
            explanation
        ));
    }

    html.push_str("</table>\n</div>\n</div>");
    html
}

/// 渲染命题蓝图 HTML
pub fn build_kisi_kisi_html(questions: &[Question]) -> String {
    let first = &questions[0];
    let mut html = String::new();

    html.push_str(&format!(
        r#"<div style="font-family: 'Times New Roman', serif; padding: 50px; color: black; background: white;">
<div style="text-align: center; font-weight: bold; font-size: 16pt; text-transform: uppercase;">KISI-KISI PENULISAN SOAL</div>
<div style="text-align: center; font-weight: bold; font-size: 14pt; margin-bottom: 35px;">MATA PELAJARAN: {}</div>
<table style="width: 100%; border-collapse: collapse; border: 1.5pt solid black; font-size: 10pt;">
<tr style="background-color: #f2f2f2;"><th style="border: 1.5pt solid black; padding: 12px;">No</th><th style="border: 1.5pt solid black; padding: 12px;">Materi</th><th style="border: 1.5pt solid black; padding: 12px;">Level</th><th style="border: 1.5pt solid black; padding: 12px;">Bentuk Soal</th><th style="border: 1.5pt solid black; padding: 12px;">No. Soal</th></tr>
"#,
        first.subject
    ));

    for (index, question) in questions.iter().enumerate() {
        html.push_str(&format!(
            "<tr><td style=\"border: 1pt solid black; padding: 10px; text-align: center;\">{}</td><td style=\"border: 1pt solid black; padding: 10px;\">{}</td><td style=\"border: 1pt solid black; padding: 10px; text-align: center;\">{}</td><td style=\"border: 1pt solid black; padding: 10px;\">{}</td><td style=\"border: 1pt solid black; padding: 10px; text-align: center;\">{}</td></tr>\n",
            index + 1,
            question.material,
            question.level,
            question.qtype,
            index + 1
        ));
    }

    html.push_str("</table>\n</div>");
    html
}

// Word 兼容的 HTML 外壳（带 BOM，保证非 ASCII 字符正常显示）
fn wrap_word_document(title: &str, body: &str) -> String {
    format!(
        "\u{feff}<html xmlns:o='urn:schemas-microsoft-com:office:office' xmlns:w='urn:schemas-microsoft-com:office:word' xmlns='http://www.w3.org/TR/REC-html40'><head><meta charset='utf-8'><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

async fn write_doc(path: &Path, html: &str) -> AppResult<()> {
    tokio::fs::write(path, html)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
}
