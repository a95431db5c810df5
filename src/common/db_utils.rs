// src/common/db_utils.rs

use serde::Deserialize;
use utoipa::IntoParams;

use crate::common::error::AppError;

const MAX_PAGE_SIZE: i64 = 100;

/// Converte o segmento de rota em um ID positivo; qualquer outra coisa é `InvalidId`.
pub fn parse_id(raw: &str) -> Result<i32, AppError> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidId),
    }
}

// Query ?page=&pageSize=
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(10).clamp(1, MAX_PAGE_SIZE)
    }

    // (limit, offset) para o SQL
    pub fn limit_offset(&self) -> (i64, i64) {
        let size = self.page_size();
        (size, (self.page() - 1) * size)
    }
}

// Listas em querystring chegam como "a,b,c"
pub fn split_csv(raw: Option<&str>) -> Option<Vec<String>> {
    let values: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();

    if values.is_empty() { None } else { Some(values) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1", Some(1))]
    #[case(" 42 ", Some(42))]
    #[case("0", None)]
    #[case("-3", None)]
    #[case("abc", None)]
    #[case("1.5", None)]
    fn parses_only_positive_ids(#[case] raw: &str, #[case] expected: Option<i32>) {
        assert_eq!(parse_id(raw).ok(), expected);
    }

    #[test]
    fn page_query_defaults_and_clamps() {
        let default = PageQuery::default();
        assert_eq!(default.limit_offset(), (10, 0));

        let third = PageQuery { page: Some(3), page_size: Some(500) };
        assert_eq!(third.limit_offset(), (100, 200));

        let negative = PageQuery { page: Some(-2), page_size: Some(0) };
        assert_eq!(negative.limit_offset(), (1, 0));
    }

    #[test]
    fn csv_lists_ignore_blanks() {
        assert_eq!(split_csv(Some("ana, luis,,")), Some(vec!["ana".to_string(), "luis".to_string()]));
        assert_eq!(split_csv(Some(" , ")), None);
        assert_eq!(split_csv(None), None);
    }
}
