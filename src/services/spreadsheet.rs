//! 表格导入/导出服务 - 业务能力层
//!
//! 列契约（导入与导出互逆）：
//! `No, Tipe Soal, Level, Materi, Teks Soal, Gambar Soal (URL),
//!  Opsi A..E, Gambar Opsi A..E (URL), Kunci Jawaban, Pembahasan, Token Paket`
//!
//! 答案列格式按题型区分：单选用单个字母；多选/复合多选用
//! `,` `;` `|` 分隔的字母；表格题用 B/S 类记号；其余为自由文本。
//! 行内数据畸形交给 Normalizer 降级处理，文件本身坏了才报错。

use std::collections::HashMap;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use serde_json::Value as JsonValue;

use crate::error::{AppError, AppResult};
use crate::models::question::{Question, RawQuestion};
use crate::services::normalizer::{normalize, QuestionDefaults};

const OPTION_LETTERS: [char; 5] = ['A', 'B', 'C', 'D', 'E'];

const HEADERS: [&str; 19] = [
    "No",
    "Tipe Soal",
    "Level",
    "Materi",
    "Teks Soal",
    "Gambar Soal (URL)",
    "Opsi A",
    "Opsi B",
    "Opsi C",
    "Opsi D",
    "Opsi E",
    "Gambar Opsi A (URL)",
    "Gambar Opsi B (URL)",
    "Gambar Opsi C (URL)",
    "Gambar Opsi D (URL)",
    "Gambar Opsi E (URL)",
    "Kunci Jawaban",
    "Pembahasan",
    "Token Paket",
];

/// 从 Excel 文件导入题目
///
/// 表头大小写不敏感；每行经 Normalizer 整形，空行跳过
pub fn import_questions_xlsx(path: &Path, defaults: &QuestionDefaults) -> AppResult<Vec<Question>> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::excel_parse_failed(path.display().to_string(), e))?;

    let sheet_names = workbook.sheet_names().to_owned();
    let first_sheet = sheet_names.first().ok_or_else(|| {
        AppError::excel_parse_failed(
            path.display().to_string(),
            std::io::Error::new(std::io::ErrorKind::InvalidData, "tidak ada worksheet"),
        )
    })?;

    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(|e| AppError::excel_parse_failed(path.display().to_string(), e))?;

    let mut rows = range.rows();
    let header_map = match rows.next() {
        Some(header_row) => build_header_map(header_row),
        None => return Ok(Vec::new()),
    };

    let mut questions = Vec::new();
    for (row_index, row) in rows.enumerate() {
        let cell = |name: &str| -> String {
            header_map
                .get(&name.to_lowercase())
                .and_then(|&col| row.get(col))
                .map(cell_to_string)
                .unwrap_or_default()
        };

        let text = cell("Teks Soal");
        let qtype = cell("Tipe Soal");
        if text.trim().is_empty() && qtype.trim().is_empty() {
            continue;
        }

        let mut options = Vec::new();
        let mut option_images = Vec::new();
        for letter in OPTION_LETTERS {
            let option = cell(&format!("Opsi {}", letter));
            if option.trim().is_empty() {
                continue;
            }
            let image = cell(&format!("Gambar Opsi {} (URL)", letter));
            options.push(JsonValue::String(option));
            option_images.push(if image.trim().is_empty() {
                None
            } else {
                Some(image)
            });
        }
        let has_images = option_images.iter().any(|img| img.is_some());

        let raw = RawQuestion {
            qtype: non_empty(qtype),
            level: non_empty(cell("Level")),
            material: non_empty(cell("Materi")),
            text: non_empty(text),
            image: non_empty(cell("Gambar Soal (URL)")),
            options: if options.is_empty() {
                None
            } else {
                Some(options)
            },
            option_images: if has_images { Some(option_images) } else { None },
            correct_answer: non_empty(cell("Kunci Jawaban")).map(JsonValue::String),
            explanation: non_empty(cell("Pembahasan")),
            quiz_token: non_empty(cell("Token Paket")),
            order: cell("No").trim().parse::<u32>().ok(),
            ..RawQuestion::default()
        };

        questions.push(normalize(raw, defaults, row_index as u32 + 1));
    }

    Ok(questions)
}

/// 把题目集合导出为 Excel 文件（导入契约的逆运算）
pub fn export_questions_xlsx(questions: &[Question], path: &Path) -> AppResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Soal")?;

    let header_format = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    worksheet.set_column_width(4, 50)?;

    for (i, question) in questions.iter().enumerate() {
        let row = i as u32 + 1;
        let col = |name: &str| -> u16 {
            HEADERS
                .iter()
                .position(|h| *h == name)
                .map(|p| p as u16)
                .unwrap_or(0)
        };

        worksheet.write_number(row, col("No"), question.order as f64)?;
        worksheet.write_string(row, col("Tipe Soal"), question.qtype.label())?;
        worksheet.write_string(row, col("Level"), question.level.as_str())?;
        worksheet.write_string(row, col("Materi"), &question.material)?;
        worksheet.write_string(row, col("Teks Soal"), &question.text)?;
        if let Some(image) = &question.image {
            worksheet.write_string(row, col("Gambar Soal (URL)"), image)?;
        }

        for (index, letter) in OPTION_LETTERS.iter().enumerate() {
            if let Some(option) = question.options.get(index) {
                worksheet.write_string(row, col(&format!("Opsi {}", letter)), option)?;
            }
            if let Some(Some(image)) = question
                .option_images
                .as_ref()
                .and_then(|imgs| imgs.get(index))
                .map(|img| img.as_deref())
            {
                worksheet.write_string(
                    row,
                    col(&format!("Gambar Opsi {} (URL)", letter)),
                    image,
                )?;
            }
        }

        worksheet.write_string(
            row,
            col("Kunci Jawaban"),
            question
                .correct_answer
                .to_answer_column(question.tf_labels.as_ref()),
        )?;
        worksheet.write_string(row, col("Pembahasan"), &question.explanation)?;
        worksheet.write_string(row, col("Token Paket"), &question.quiz_token)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn build_header_map(header_row: &[Data]) -> HashMap<String, usize> {
    header_row
        .iter()
        .enumerate()
        .map(|(i, cell)| (cell_to_string(cell).trim().to_lowercase(), i))
        .collect()
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(v) => {
            if v.fract() == 0.0 {
                format!("{}", *v as i64)
            } else {
                v.to_string()
            }
        }
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => if *v { "TRUE" } else { "FALSE" }.to_string(),
        _ => String::new(),
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::AnswerKey;
    use crate::models::level::Level;
    use crate::models::phase::Phase;
    use crate::models::qtype::QuestionType;
    use crate::models::question::TfLabels;

    fn sample(qtype: QuestionType, answer: AnswerKey, options: &[&str], order: u32) -> Question {
        Question {
            id: Question::new_id(),
            qtype,
            level: Level::L2,
            subject: "IPA".to_string(),
            phase: Phase::D,
            material: "Ekosistem".to_string(),
            text: format!("Soal nomor {}", order),
            stimulus_text: None,
            explanation: "Karena demikian.".to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            option_images: None,
            correct_answer: answer,
            tf_labels: qtype.default_tf_labels(),
            image: None,
            quiz_token: "IPA-01".to_string(),
            order,
            is_deleted: false,
            created_at: 1,
        }
    }

    fn defaults() -> QuestionDefaults {
        QuestionDefaults {
            subject: "IPA".to_string(),
            phase: Phase::D,
            material: "Ekosistem".to_string(),
            quiz_token: "IPA-01".to_string(),
        }
    }

    #[test]
    fn test_xlsx_round_trip() {
        let dir = std::env::temp_dir().join("educbt_spreadsheet_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("round_trip.xlsx");

        let questions = vec![
            sample(
                QuestionType::PilihanGanda,
                AnswerKey::Index(2),
                &["a", "b", "c", "d"],
                1,
            ),
            sample(
                QuestionType::Mcma,
                AnswerKey::Indices(vec![0, 2]),
                &["a", "b", "c", "d"],
                2,
            ),
            sample(
                QuestionType::BenarSalah,
                AnswerKey::Flags(vec![true, false, true]),
                &["p1", "p2", "p3"],
                3,
            ),
            sample(
                QuestionType::Kompleks,
                AnswerKey::Flags(vec![false, true, false, true]),
                &["a", "b", "c", "d"],
                4,
            ),
            sample(QuestionType::Isian, AnswerKey::Text("klorofil".to_string()), &[], 5),
        ];

        export_questions_xlsx(&questions, &path).unwrap();
        let imported = import_questions_xlsx(&path, &defaults()).unwrap();

        assert_eq!(imported.len(), questions.len());
        for (original, round_tripped) in questions.iter().zip(&imported) {
            assert_eq!(original.qtype, round_tripped.qtype);
            assert_eq!(original.text, round_tripped.text);
            assert_eq!(original.options, round_tripped.options);
            assert_eq!(original.correct_answer, round_tripped.correct_answer);
            assert_eq!(original.order, round_tripped.order);
            assert_eq!(original.quiz_token, round_tripped.quiz_token);
        }

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_import_decodes_answer_letters() {
        let dir = std::env::temp_dir().join("educbt_spreadsheet_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("letters.xlsx");

        // 手工构造一个 MCMA 行，答案列是字母表
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        worksheet.write_number(1, 0, 1.0).unwrap();
        worksheet.write_string(1, 1, "Pilihan Jamak (MCMA)").unwrap();
        worksheet.write_string(1, 4, "Pilih dua jawaban.").unwrap();
        worksheet.write_string(1, 6, "opsi a").unwrap();
        worksheet.write_string(1, 7, "opsi b").unwrap();
        worksheet.write_string(1, 8, "opsi c").unwrap();
        worksheet.write_string(1, 9, "opsi d").unwrap();
        worksheet.write_string(1, 16, "A, C").unwrap();
        workbook.save(&path).unwrap();

        let imported = import_questions_xlsx(&path, &defaults()).unwrap();
        assert_eq!(imported.len(), 1);
        assert_eq!(imported[0].qtype, QuestionType::Mcma);
        assert_eq!(imported[0].correct_answer, AnswerKey::Indices(vec![0, 2]));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_import_pads_short_table_keys() {
        let dir = std::env::temp_dir().join("educbt_spreadsheet_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("padding.xlsx");

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header).unwrap();
        }
        worksheet.write_string(1, 1, "(Benar/Salah)").unwrap();
        worksheet.write_string(1, 4, "Tentukan kebenaran.").unwrap();
        worksheet.write_string(1, 6, "pernyataan 1").unwrap();
        worksheet.write_string(1, 7, "pernyataan 2").unwrap();
        worksheet.write_string(1, 8, "pernyataan 3").unwrap();
        // 记号比陈述少，末尾补 false
        worksheet.write_string(1, 16, "B,S").unwrap();
        workbook.save(&path).unwrap();

        let imported = import_questions_xlsx(&path, &defaults()).unwrap();
        assert_eq!(
            imported[0].correct_answer,
            AnswerKey::Flags(vec![true, false, false])
        );
        assert_eq!(imported[0].tf_labels, Some(TfLabels::new("Benar", "Salah")));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_import_missing_file_is_error() {
        let result = import_questions_xlsx(Path::new("/tidak/ada.xlsx"), &defaults());
        assert!(result.is_err());
    }
}
