use crate::error::AppError;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 신규 경매 상태
pub const STATUS_LIVE: &str = "Live";

/// 경매 종료 시각을 지정하지 않은 경우의 기본 경매 기간
const DEFAULT_AUCTION_DAYS: i64 = 10;

/// timestamptz 정밀도(마이크로초)로 자른 현재 시각
pub fn current_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

// 경매 모델
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Auction {
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
    pub version: i64,
}

impl Auction {
    /// 최저 낙찰가(reserve price) 설정 여부, 0 이면 설정 없음
    pub fn has_reserve_price(&self) -> bool {
        self.reserve_price > 0
    }

    pub fn is_owned_by(&self, caller: &str) -> bool {
        self.seller == caller
    }
}

// 경매 생성 요청
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAuction {
    pub make: String,
    pub model: String,
    pub color: String,
    pub mileage: i32,
    pub year: i32,
    pub image_url: String,
    pub reserve_price: i64,
    pub auction_end: Option<DateTime<Utc>>,
}

impl CreateAuction {
    pub fn validate(&self) -> Result<(), AppError> {
        require_text("make", &self.make)?;
        require_text("model", &self.model)?;
        if self.reserve_price < 0 {
            return Err(AppError::Validation(
                "reservePrice must not be negative".to_string(),
            ));
        }
        if self.mileage < 0 {
            return Err(AppError::Validation(
                "mileage must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// 검증을 통과한 요청으로 새 경매 레코드 생성
    pub fn into_auction(self, seller: &str, now: DateTime<Utc>) -> Auction {
        Auction {
            id: Uuid::new_v4(),
            make: self.make.trim().to_string(),
            model: self.model.trim().to_string(),
            color: self.color,
            mileage: self.mileage,
            year: self.year,
            image_url: self.image_url,
            reserve_price: self.reserve_price,
            seller: seller.to_string(),
            winner: None,
            sold_amount: None,
            current_high_bid: None,
            status: STATUS_LIVE.to_string(),
            auction_end: self
                .auction_end
                .map(|end| end.trunc_subsecs(6))
                .unwrap_or_else(|| now + Duration::days(DEFAULT_AUCTION_DAYS)),
            created_at: now,
            updated_at: now,
            version: 1,
        }
    }
}

// 경매 수정 요청 (부분 수정)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAuction {
    pub make: Option<String>,
    pub model: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<i32>,
    pub year: Option<i32>,
}

impl UpdateAuction {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(make) = &self.make {
            require_text("make", make)?;
        }
        if let Some(model) = &self.model {
            require_text("model", model)?;
        }
        if matches!(self.mileage, Some(m) if m < 0) {
            return Err(AppError::Validation(
                "mileage must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// 지정된 필드만 반영
    pub fn apply_to(&self, auction: &mut Auction) {
        if let Some(make) = &self.make {
            auction.make = make.trim().to_string();
        }
        if let Some(model) = &self.model {
            auction.model = model.trim().to_string();
        }
        if let Some(color) = &self.color {
            auction.color = color.clone();
        }
        if let Some(mileage) = self.mileage {
            auction.mileage = mileage;
        }
        if let Some(year) = self.year {
            auction.year = year;
        }
    }
}

/// 경매 목록 필터
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuctionFilter {
    pub make: Option<String>,
    pub seller: Option<String>,
    pub winner: Option<String>,
    /// 이 시각 이후 수정된 경매만
    #[serde(rename = "date")]
    pub updated_after: Option<DateTime<Utc>>,
}

impl AuctionFilter {
    pub fn matches(&self, auction: &Auction) -> bool {
        self.make
            .as_deref()
            .map_or(true, |make| auction.make.eq_ignore_ascii_case(make))
            && self
                .seller
                .as_deref()
                .map_or(true, |seller| auction.seller == seller)
            && self
                .winner
                .as_deref()
                .map_or(true, |winner| auction.winner.as_deref() == Some(winner))
            && self
                .updated_after
                .map_or(true, |after| auction.updated_at > after)
    }
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}
