//! 韓國電話號碼正規化
//!
//! 先去掉所有非數字字元，再依前綴與位數決定連字號位置。
//! 任何輸入都會回傳字串，不會失敗；無數字時回傳空字串。

/// 手機號碼前綴
pub const MOBILE_PREFIXES: [&str; 6] = ["010", "011", "016", "017", "018", "019"];

/// 070 網路電話、050 個人號碼、080 免付費
pub const SERVICE_PREFIXES: [&str; 3] = ["070", "050", "080"];

/// 首爾以外的地區碼
pub const AREA_PREFIXES: [&str; 16] = [
    "031", "032", "033", "041", "042", "043", "044", "051", "052", "053", "054", "055", "061",
    "062", "063", "064",
];

/// 8 碼全國代表號 (1588-xxxx 等) 的開頭兩碼
pub const SHORT_CODE_LEADS: [&str; 3] = ["15", "16", "18"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrefixClass {
    ShortCode,
    Seoul,
    ServiceCode,
    Mobile,
    AreaCode,
    Unclassified,
}

/// 依前綴分類純數字字串，順序與 [`normalize`] 的判斷順序一致
pub fn classify(digits: &str) -> PrefixClass {
    let head3 = digits.get(..3).unwrap_or("");

    if digits.len() == 8 && SHORT_CODE_LEADS.iter().any(|lead| digits.starts_with(lead)) {
        PrefixClass::ShortCode
    } else if digits.starts_with("02") {
        PrefixClass::Seoul
    } else if SERVICE_PREFIXES.contains(&head3) {
        PrefixClass::ServiceCode
    } else if MOBILE_PREFIXES.contains(&head3) {
        PrefixClass::Mobile
    } else if AREA_PREFIXES.contains(&head3) {
        PrefixClass::AreaCode
    } else {
        PrefixClass::Unclassified
    }
}

/// 只保留 ASCII 數字
pub fn strip_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// 將使用者輸入的電話號碼轉成帶連字號的標準格式
///
/// ```
/// use sales_log::core::phone::normalize;
///
/// assert_eq!(normalize("010 1234 5678"), "010-1234-5678");
/// assert_eq!(normalize("(02) 1234-5678"), "02-1234-5678");
/// assert_eq!(normalize("15881234"), "1588-1234");
/// assert_eq!(normalize("no digits"), "");
/// ```
pub fn normalize(raw: &str) -> String {
    let digits = strip_digits(raw);
    let d = digits.as_str();
    let len = d.len();

    if len == 0 {
        return String::new();
    }

    match classify(d) {
        PrefixClass::ShortCode => join(&[part(d, 0, 4), part(d, 4, 8)]),
        PrefixClass::Seoul => match len {
            0..=2 => digits,
            3..=5 => join(&["02", part(d, 2, len)]),
            6..=9 => join(&["02", part(d, 2, 5), part(d, 5, 9)]),
            _ => join(&["02", part(d, 2, 6), part(d, 6, 10)]),
        },
        PrefixClass::ServiceCode => match len {
            0..=3 => digits,
            4..=7 => join(&[part(d, 0, 3), part(d, 3, len)]),
            _ => join(&[part(d, 0, 3), part(d, 3, 7), part(d, 7, 11)]),
        },
        PrefixClass::Mobile => match len {
            0..=3 => digits,
            4..=7 => join(&[part(d, 0, 3), part(d, 3, len)]),
            10 => join(&[part(d, 0, 3), part(d, 3, 6), part(d, 6, 10)]),
            _ => join(&[part(d, 0, 3), part(d, 3, 7), part(d, 7, 11)]),
        },
        PrefixClass::AreaCode => match len {
            0..=3 => digits,
            4..=6 => join(&[part(d, 0, 3), part(d, 3, len)]),
            _ => join(&[part(d, 0, 3), part(d, 3, 6), part(d, 6, 10)]),
        },
        PrefixClass::Unclassified => match len {
            8 => join(&[part(d, 0, 4), part(d, 4, 8)]),
            10 => join(&[part(d, 0, 3), part(d, 3, 6), part(d, 6, 10)]),
            11.. => join(&[part(d, 0, 3), part(d, 3, 7), part(d, 7, 11)]),
            0..=3 => digits,
            _ => join(&[part(d, 0, 3), part(d, 3, len)]),
        },
    }
}

// 超出長度的切片會被截到字串尾端
fn part(digits: &str, start: usize, end: usize) -> &str {
    let end = end.min(digits.len());
    let start = start.min(end);
    &digits[start..end]
}

fn join(parts: &[&str]) -> String {
    parts.join("-")
}
