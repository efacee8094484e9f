//! Search-tag extraction from lecture descriptions.

use regex::Regex;
use std::sync::LazyLock;

const MAX_TAGS: usize = 6;
const MAX_ITEMS_PER_PATTERN: usize = 3;

/// Domain terms promoted to tags when they appear in a description.
const COMMON_KEYWORDS: [&str; 9] = [
    "안전",
    "교육",
    "장비",
    "사용법",
    "점검",
    "응급처치",
    "비상대응",
    "법규",
    "규정",
];

static BULLET_ITEMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[•·▪▫◦‣⁃]\s*([^•·▪▫◦‣⁃\n]+)").expect("valid regex"));
static NUMBERED_ITEMS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\s*([^\d\n]+)").expect("valid regex"));

/// Extract up to six search tags: bullet items, numbered items, then common
/// domain keywords found in the text.
pub fn extract_tags(description: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    let mut push = |candidate: &str| {
        let trimmed = candidate.trim();
        if trimmed.chars().count() > 1 && !tags.iter().any(|t| t == trimmed) && tags.len() < MAX_TAGS
        {
            tags.push(trimmed.to_string());
        }
    };

    for capture in BULLET_ITEMS
        .captures_iter(description)
        .take(MAX_ITEMS_PER_PATTERN)
    {
        push(&capture[1]);
    }
    for capture in NUMBERED_ITEMS
        .captures_iter(description)
        .take(MAX_ITEMS_PER_PATTERN)
    {
        push(&capture[1]);
    }
    for keyword in COMMON_KEYWORDS {
        if description.contains(keyword) {
            push(keyword);
        }
    }

    if tags.is_empty() {
        // Minimal default so search always has something to index
        tags = vec!["교육".to_string(), "안전".to_string()];
    }

    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullets_become_tags() {
        let description = "이 강의는 다음 내용을 다룹니다:\n• 기본 안전수칙\n• 작업 전 점검사항\n• 위험 상황 대처방법";
        let tags = extract_tags(description);
        assert!(tags.contains(&"기본 안전수칙".to_string()));
        assert!(tags.contains(&"작업 전 점검사항".to_string()));
    }

    #[test]
    fn test_common_keywords_added() {
        let tags = extract_tags("장비 점검과 안전 수칙");
        assert!(tags.contains(&"장비".to_string()));
        assert!(tags.contains(&"점검".to_string()));
        assert!(tags.contains(&"안전".to_string()));
    }

    #[test]
    fn test_capped_at_six() {
        let description = "• 하나\n• 둘셋\n• 넷다섯\n1. 여섯일곱\n2. 여덟아홉\n안전 교육 장비 점검 법규 규정";
        assert!(extract_tags(description).len() <= MAX_TAGS);
    }

    #[test]
    fn test_empty_description_gets_defaults() {
        assert_eq!(extract_tags(""), vec!["교육", "안전"]);
    }

    #[test]
    fn test_no_duplicates() {
        let tags = extract_tags("안전 안전 안전 교육");
        let unique: std::collections::HashSet<&String> = tags.iter().collect();
        assert_eq!(unique.len(), tags.len());
    }
}
