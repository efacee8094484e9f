//! Keyword-substitution fallback used when the remote translator is absent
//! or keeps failing.
//!
//! Tables map common Korean training-domain terms to per-language
//! equivalents. When no keyword matches, a language code suffix keeps the
//! five fallback values distinct so later language variants never collide on
//! a filename.

use polyvid_core::models::Language;

use crate::sanitize::{make_filename_safe, truncate_bytes, MAX_FILENAME_BYTES};

fn keyword_table(language: Language) -> &'static [(&'static str, &'static str)] {
    match language {
        Language::En => &[
            ("안전", "Safety"),
            ("교육", "Training"),
            ("기초", "Basic"),
            ("용접", "Welding"),
            ("크레인", "Crane"),
            ("조작", "Operation"),
            ("장비", "Equipment"),
            ("사용법", "Usage"),
            ("점검", "Inspection"),
            ("유지보수", "Maintenance"),
            ("응급처치", "First_Aid"),
            ("산업", "Industrial"),
            ("건설", "Construction"),
            ("기계", "Machine"),
            ("공구", "Tool"),
            ("실습", "Practice"),
            ("법규", "Regulation"),
            ("규정", "Standard"),
            ("작업", "Work"),
            ("현장", "Site"),
            ("관리", "Management"),
            ("위험", "Risk"),
        ],
        Language::Zh => &[
            ("안전", "安全"),
            ("교육", "培训"),
            ("기초", "基础"),
            ("용접", "焊接"),
            ("크레인", "起重机"),
            ("조작", "操作"),
            ("장비", "设备"),
            ("사용법", "使用方法"),
            ("점검", "检查"),
            ("유지보수", "维护"),
            ("응급처치", "急救"),
            ("산업", "工业"),
            ("건설", "建设"),
            ("기계", "机器"),
            ("공구", "工具"),
        ],
        Language::Vi => &[
            ("안전", "An_Toan"),
            ("교육", "Dao_Tao"),
            ("기초", "Co_Ban"),
            ("용접", "Han"),
            ("크레인", "Cau_Truc"),
            ("조작", "Van_Hanh"),
            ("장비", "Thiet_Bi"),
            ("산업", "Cong_Nghiep"),
            ("건설", "Xay_Dung"),
            ("기계", "May_Moc"),
        ],
        Language::Th => &[
            ("안전", "ปลอดภัย"),
            ("교육", "การศึกษา"),
            ("기초", "พื้นฐาน"),
            ("용접", "เชื่อม"),
            ("크레인", "เครน"),
            ("조작", "ดำเนินงาน"),
            ("장비", "อุปกรณ์"),
        ],
        Language::Ja => &[
            ("안전", "安全"),
            ("교육", "教育"),
            ("기초", "基礎"),
            ("용접", "溶接"),
            ("크레인", "クレーン"),
            ("조작", "操作"),
            ("장비", "設備"),
            ("공구", "工具"),
        ],
        // The Korean "fallback" is just the sanitized original
        Language::Ko => &[],
    }
}

/// Append the language code so an unmodified fallback stays distinct.
pub fn append_language_suffix(value: &str, language: Language) -> String {
    let suffix = language.code().to_uppercase();
    let base = truncate_bytes(value, MAX_FILENAME_BYTES - suffix.len() - 1);
    format!("{}_{}", base.trim_end_matches('_'), suffix)
}

/// Keyword-based fallback translation of `source` into `language`.
pub fn fallback_translation(source: &str, language: Language) -> String {
    let mut result = source.to_string();
    for (korean, replacement) in keyword_table(language) {
        result = result.replace(korean, replacement);
    }

    let safe = make_filename_safe(&result);
    if result == source {
        // Nothing matched; only the suffix distinguishes the languages
        append_language_suffix(&safe, language)
    } else {
        safe
    }
}
