//! Leaf Sentinel Common Library
//!
//! コア（CLI）と各判定バックエンドで共有される型とユーティリティ

pub mod types;
pub mod diseases;
pub mod error;
pub mod parser;
pub mod prompts;

pub use types::{FocusPoint, Label, Prediction};
pub use diseases::{disease_info, disease_library, DiseaseInfo};
pub use error::{Error, Result};
pub use parser::{extract_json, parse_prediction_response};
pub use prompts::build_classify_prompt;
