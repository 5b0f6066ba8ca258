//! 健康检查结果数据结构
//!
//! 定义单项检查结果、整体状态以及 `/health` 的JSON格式

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::time::Duration;

/// 整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallStatus {
    /// 全部检查通过
    #[serde(rename = "OK")]
    Ok,
    /// 至少一项检查失败
    #[serde(rename = "FAIL")]
    Fail,
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverallStatus::Ok => write!(f, "OK"),
            OverallStatus::Fail => write!(f, "FAIL"),
        }
    }
}

impl OverallStatus {
    /// 判断状态是否为健康
    pub fn is_ok(&self) -> bool {
        matches!(self, OverallStatus::Ok)
    }
}

/// 单项检查结果
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    /// 检查名称
    pub name: String,
    /// 是否通过
    pub passed: bool,
    /// 说明信息
    pub message: Option<String>,
    /// 执行耗时
    pub duration: Duration,
}

impl CheckResult {
    /// 执行耗时（毫秒）
    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }
}

/// 一次完整评估的报告，`results` 与配置中的检查一一对应且顺序一致
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub status: OverallStatus,
    pub results: Vec<CheckResult>,
}

impl HealthReport {
    /// 根据检查结果计算整体状态
    pub fn from_results(results: Vec<CheckResult>) -> Self {
        let status = if results.iter().all(|r| r.passed) {
            OverallStatus::Ok
        } else {
            OverallStatus::Fail
        };
        Self { status, results }
    }

    /// 是否全部通过
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// 失败的检查
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| !r.passed)
    }
}

/// `checks` 对象中的单项
#[derive(Serialize)]
struct CheckEntry<'a> {
    passed: bool,
    message: Option<&'a str>,
}

/// 按结果顺序序列化的 `checks` 对象
struct ChecksMap<'a>(&'a [CheckResult]);

impl Serialize for ChecksMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for result in self.0 {
            map.serialize_entry(
                &result.name,
                &CheckEntry {
                    passed: result.passed,
                    message: result.message.as_deref(),
                },
            )?;
        }
        map.end()
    }
}

// 没有检查时只输出 {"status":"OK"}
impl Serialize for HealthReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.results.is_empty() { 1 } else { 2 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("status", &self.status)?;
        if !self.results.is_empty() {
            map.serialize_entry("checks", &ChecksMap(&self.results))?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(name: &str, passed: bool, message: Option<&str>) -> CheckResult {
        CheckResult {
            name: name.to_string(),
            passed,
            message: message.map(str::to_string),
            duration: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_empty_report_serializes_status_only() {
        let report = HealthReport::from_results(Vec::new());
        assert!(report.is_ok());
        assert_eq!(serde_json::to_string(&report).unwrap(), r#"{"status":"OK"}"#);
    }

    #[test]
    fn test_report_preserves_check_order() {
        let report = HealthReport::from_results(vec![
            result("zeta", true, None),
            result("alpha", false, Some("down")),
            result("mid", true, Some("slow")),
        ]);

        assert_eq!(report.status, OverallStatus::Fail);
        assert_eq!(
            serde_json::to_string(&report).unwrap(),
            concat!(
                r#"{"status":"FAIL","checks":{"#,
                r#""zeta":{"passed":true,"message":null},"#,
                r#""alpha":{"passed":false,"message":"down"},"#,
                r#""mid":{"passed":true,"message":"slow"}}}"#
            )
        );
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_all_passed_is_ok() {
        let report = HealthReport::from_results(vec![result("a", true, None)]);
        assert_eq!(report.status, OverallStatus::Ok);
        assert_eq!(report.status.to_string(), "OK");
        assert_eq!(report.results[0].duration_ms(), 3);
    }
}
