use crate::auction::model::Auction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// 검색 읽기 모델 (경매 필드를 평탄화)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SearchItem {
    pub id: Uuid,
    pub make: String,
    pub model: String,
    pub color: String,
    pub mileage: i32,
    pub year: i32,
    pub image_url: String,
    pub reserve_price: i64,
    pub seller: String,
    pub winner: Option<String>,
    pub sold_amount: Option<i64>,
    pub current_high_bid: Option<i64>,
    pub status: String,
    pub auction_end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 마지막으로 반영된 이벤트 버전
    pub version: i64,
}

impl From<&Auction> for SearchItem {
    fn from(auction: &Auction) -> Self {
        Self {
            id: auction.id,
            make: auction.make.clone(),
            model: auction.model.clone(),
            color: auction.color.clone(),
            mileage: auction.mileage,
            year: auction.year,
            image_url: auction.image_url.clone(),
            reserve_price: auction.reserve_price,
            seller: auction.seller.clone(),
            winner: auction.winner.clone(),
            sold_amount: auction.sold_amount,
            current_high_bid: auction.current_high_bid,
            status: auction.status.clone(),
            auction_end: auction.auction_end,
            created_at: auction.created_at,
            updated_at: auction.updated_at,
            version: auction.version,
        }
    }
}

// 검색 결과 페이지
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub results: Vec<SearchItem>,
    pub page_count: i64,
    pub total_count: i64,
}

impl SearchPage {
    pub fn new(results: Vec<SearchItem>, total_count: i64, page_size: i64) -> Self {
        let page_count = if total_count == 0 {
            0
        } else {
            (total_count + page_size - 1) / page_size
        };
        Self {
            results,
            page_count,
            total_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(SearchPage::new(vec![], 0, 4).page_count, 0);
        assert_eq!(SearchPage::new(vec![], 4, 4).page_count, 1);
        assert_eq!(SearchPage::new(vec![], 9, 4).page_count, 3);
    }
}
