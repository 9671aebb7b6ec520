//! 校验结果
//!
//! 一次校验产生的错误、警告和元数据，可渲染为可读报告

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// 校验结果
///
/// 不变量: `is_valid()` 只看错误列表是否为空，与 `success` 字段无关
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationResult {
    /// 校验流程本身是否完成
    pub success: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: BTreeMap<String, Value>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    /// 合并另一个结果（用于多文件校验）
    pub fn merge(&mut self, label: &str, other: ValidationResult) {
        self.success &= other.success;
        self.errors
            .extend(other.errors.into_iter().map(|e| format!("{}: {}", label, e)));
        self.warnings
            .extend(other.warnings.into_iter().map(|w| format!("{}: {}", label, w)));
        self.metadata
            .insert(label.to_string(), serde_json::to_value(other.metadata).unwrap_or(Value::Null));
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.is_valid() { "VALID" } else { "INVALID" };
        writeln!(f, "Validation: {}", status)?;

        if !self.errors.is_empty() {
            writeln!(f, "Errors ({}):", self.errors.len())?;
            for error in &self.errors {
                writeln!(f, "  - {}", error)?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f, "Warnings ({}):", self.warnings.len())?;
            for warning in &self.warnings {
                writeln!(f, "  - {}", warning)?;
            }
        }

        if !self.metadata.is_empty() {
            writeln!(f, "Details:")?;
            for (key, value) in &self.metadata {
                writeln!(f, "  {}: {}", key, value)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_iff_no_errors() {
        let mut result = ValidationResult::new();
        result.add_warning("low level");
        assert!(result.is_valid());

        result.add_error("too short");
        assert!(!result.is_valid());
    }

    #[test]
    fn test_success_flag_independent() {
        let mut result = ValidationResult::new();
        result.success = false;
        assert!(result.is_valid());
    }

    #[test]
    fn test_report_rendering() {
        let mut result = ValidationResult::new();
        result.add_error("file missing");
        result.add_warning("stereo input");
        result.insert_metadata("duration", 4.5);

        let report = result.to_string();
        assert!(report.contains("INVALID"));
        assert!(report.contains("  - file missing"));
        assert!(report.contains("  - stereo input"));
        assert!(report.contains("duration: 4.5"));
    }

    #[test]
    fn test_merge_prefixes_label() {
        let mut total = ValidationResult::new();
        let mut one = ValidationResult::new();
        one.add_error("too short");
        total.merge("a.wav", one);

        assert_eq!(total.errors, vec!["a.wav: too short"]);
        assert!(total.metadata.contains_key("a.wav"));
    }
}
