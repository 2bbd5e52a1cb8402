use crate::aggregate::MessageFormatter;
use crate::errors::FusionError;
use std::fmt;
use std::str::FromStr;

/// Narration languages. Amounts are always Korean won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Korean,
    English,
    Japanese,
    Chinese,
}

impl Locale {
    pub fn code(&self) -> &'static str {
        match self {
            Locale::Korean => "ko",
            Locale::English => "en",
            Locale::Japanese => "ja",
            Locale::Chinese => "zh",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = FusionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ko" | "ko-kr" | "korean" | "한국어" => Ok(Locale::Korean),
            "en" | "en-us" | "english" | "영어" => Ok(Locale::English),
            "ja" | "ja-jp" | "japanese" | "일본어" => Ok(Locale::Japanese),
            "zh" | "zh-cn" | "chinese" | "중국어" => Ok(Locale::Chinese),
            _ => Err(FusionError::UnknownLocale(s.to_string())),
        }
    }
}

impl MessageFormatter for Locale {
    fn no_detections(&self) -> String {
        match self {
            Locale::Korean => "감지된 금액이 없습니다.",
            Locale::English => "No money was detected.",
            Locale::Japanese => "金額が検出されませんでした。",
            Locale::Chinese => "未检测到金额。",
        }
        .to_string()
    }

    fn summary(&self, amounts: &[u32], total: u64) -> String {
        match self {
            Locale::Korean => format!(
                "감지된 금액은 {}이며, 총합은 {total}원 입니다.",
                join(amounts, "원", ", ")
            ),
            Locale::English => format!(
                "Detected amounts are {}. The total is {total} won.",
                join(amounts, " won", ", ")
            ),
            Locale::Japanese => format!(
                "検出された金額は{}で、合計は{total}ウォンです。",
                join(amounts, "ウォン", "、")
            ),
            Locale::Chinese => format!(
                "检测到的金额为{}，总计{total}韩元。",
                join(amounts, "韩元", "、")
            ),
        }
    }
}

fn join(amounts: &[u32], unit: &str, separator: &str) -> String {
    amounts
        .iter()
        .map(|amount| format!("{amount}{unit}"))
        .collect::<Vec<_>>()
        .join(separator)
}
