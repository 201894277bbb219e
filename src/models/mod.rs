pub mod answer;
pub mod bank;
pub mod level;
pub mod loaders;
pub mod phase;
pub mod qtype;
pub mod question;
pub mod request;

pub use answer::AnswerKey;
pub use bank::QuestionBank;
pub use level::Level;
pub use loaders::{load_all_request_files, load_raw_questions, save_questions, RequestFile};
pub use phase::Phase;
pub use qtype::QuestionType;
pub use question::{Question, RawQuestion, TfLabels};
pub use request::{GenerationRequest, ReferenceImage};
