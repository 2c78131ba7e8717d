use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const DEFAULT_PAGE_SIZE: i64 = 4;
const MAX_PAGE_SIZE: i64 = 100;
/// endingSoon 필터 기준 시간
const ENDING_SOON_HOURS: i64 = 6;

/// 정렬 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchOrder {
    Make,
    New,
    #[default]
    AuctionEnd,
}

impl SearchOrder {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("make") => SearchOrder::Make,
            Some("new") => SearchOrder::New,
            _ => SearchOrder::AuctionEnd,
        }
    }

    /// SQL 바인딩용 키
    pub fn as_key(self) -> &'static str {
        match self {
            SearchOrder::Make => "make",
            SearchOrder::New => "new",
            SearchOrder::AuctionEnd => "auctionEnd",
        }
    }
}

/// 경매 종료 시각 기준 필터
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchFilter {
    Finished,
    EndingSoon,
    #[default]
    Live,
}

impl SearchFilter {
    fn parse(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("finished") => SearchFilter::Finished,
            Some("endingsoon") => SearchFilter::EndingSoon,
            _ => SearchFilter::Live,
        }
    }

    pub fn as_key(self) -> &'static str {
        match self {
            SearchFilter::Finished => "finished",
            SearchFilter::EndingSoon => "endingSoon",
            SearchFilter::Live => "live",
        }
    }

    /// 종료 시각이 필터 조건을 만족하는지
    pub fn matches(self, auction_end: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match self {
            SearchFilter::Finished => auction_end < now,
            SearchFilter::EndingSoon => {
                auction_end >= now && auction_end < now + Duration::hours(ENDING_SOON_HOURS)
            }
            SearchFilter::Live => auction_end > now,
        }
    }
}

/// 검색 요청 파라미터 (쿼리 스트링)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchParams {
    pub search_term: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    pub seller: Option<String>,
    pub winner: Option<String>,
    pub order_by: Option<String>,
    pub filter_by: Option<String>,
}

/// 정규화된 검색 조건
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub search_term: Option<String>,
    pub seller: Option<String>,
    pub winner: Option<String>,
    pub order: SearchOrder,
    pub filter: SearchFilter,
    pub page_number: i64,
    pub page_size: i64,
}

impl SearchQuery {
    pub fn offset(&self) -> i64 {
        (self.page_number - 1) * self.page_size
    }
}

impl From<SearchParams> for SearchQuery {
    fn from(params: SearchParams) -> Self {
        Self {
            search_term: non_blank(params.search_term),
            seller: non_blank(params.seller),
            winner: non_blank(params.winner),
            order: SearchOrder::parse(params.order_by.as_deref()),
            filter: SearchFilter::parse(params.filter_by.as_deref()),
            page_number: params.page_number.unwrap_or(1).max(1),
            page_size: params
                .page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// region:    --- Queries
/// 검색 조건 ($1 검색어, $2 판매자, $3 낙찰자, $4 필터, $5 현재 시각)
const SEARCH_WHERE: &str = r#"
    WHERE NOT deleted
      AND ($1::text IS NULL OR (make || ' ' || model || ' ' || color) ILIKE '%' || $1 || '%')
      AND ($2::text IS NULL OR seller = $2)
      AND ($3::text IS NULL OR winner = $3)
      AND CASE $4::text
            WHEN 'finished' THEN auction_end < $5
            WHEN 'endingSoon' THEN auction_end >= $5 AND auction_end < $5 + interval '6 hours'
            ELSE auction_end > $5
          END
"#;

pub(crate) fn search_sql() -> String {
    format!(
        r#"
    SELECT id, make, model, color, mileage, year, image_url, reserve_price, seller, winner, sold_amount,
           current_high_bid, status, auction_end, created_at, updated_at, version
    FROM search_items
    {SEARCH_WHERE}
    ORDER BY
        CASE WHEN $6::text = 'make' THEN make END ASC,
        CASE WHEN $6::text = 'make' THEN model END ASC,
        CASE WHEN $6::text = 'new' THEN created_at END DESC,
        auction_end ASC,
        id
    LIMIT $7 OFFSET $8
"#
    )
}

pub(crate) fn count_sql() -> String {
    format!("SELECT COUNT(*) FROM search_items {SEARCH_WHERE}")
}
// endregion: --- Queries

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_first_page_of_four_live_ordered_by_end() {
        let query = SearchQuery::from(SearchParams::default());

        assert_eq!(query.page_number, 1);
        assert_eq!(query.page_size, 4);
        assert_eq!(query.offset(), 0);
        assert_eq!(query.order, SearchOrder::AuctionEnd);
        assert_eq!(query.filter, SearchFilter::Live);
    }

    #[test]
    fn parses_order_and_filter_case_insensitively() {
        let query = SearchQuery::from(SearchParams {
            order_by: Some("NEW".to_string()),
            filter_by: Some("endingSoon".to_string()),
            page_number: Some(3),
            page_size: Some(10),
            search_term: Some("  ".to_string()),
            ..Default::default()
        });

        assert_eq!(query.order, SearchOrder::New);
        assert_eq!(query.filter, SearchFilter::EndingSoon);
        assert_eq!(query.offset(), 20);
        assert_eq!(query.search_term, None);
    }

    #[test]
    fn clamps_page_bounds() {
        let query = SearchQuery::from(SearchParams {
            page_number: Some(-2),
            page_size: Some(10_000),
            ..Default::default()
        });

        assert_eq!(query.page_number, 1);
        assert_eq!(query.page_size, 100);
    }

    #[test]
    fn ending_soon_only_matches_within_six_hours() {
        let now = Utc::now();
        let filter = SearchFilter::EndingSoon;

        assert!(filter.matches(now + Duration::hours(2), now));
        assert!(!filter.matches(now + Duration::hours(7), now));
        assert!(!filter.matches(now - Duration::hours(1), now));
        assert!(SearchFilter::Finished.matches(now - Duration::hours(1), now));
    }
}
