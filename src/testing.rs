//! 테스트용 인메모리 구현체
use crate::auction::events::AuctionEvent;
use crate::auction::model::{Auction, AuctionFilter};
use crate::auction::repository::AuctionRepository;
use crate::error::AppError;
use crate::event_store::EventPublisher;
use crate::message_broker::ReceivedMessage;
use crate::search::consumer::DeadLetterSink;
use crate::search::model::{SearchItem, SearchPage};
use crate::search::query::{SearchOrder, SearchQuery};
use crate::search::repository::SearchRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// 남은 강제 실패 횟수를 하나 소모
fn take_failure(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

// region:    --- Auctions
/// 경매와 아웃박스를 같은 잠금 아래에서 함께 기록
#[derive(Default)]
pub struct InMemoryAuctionRepository {
    auctions: Mutex<HashMap<Uuid, Auction>>,
    outbox: Mutex<Vec<AuctionEvent>>,
    conflicts: AtomicU32,
}

impl InMemoryAuctionRepository {
    /// 다음 `n` 번의 수정/삭제를 버전 충돌로 처리
    pub fn fail_next_writes(&self, n: u32) {
        self.conflicts.store(n, Ordering::SeqCst);
    }

    pub fn is_empty(&self) -> bool {
        self.auctions.lock().unwrap().is_empty()
    }

    pub fn outbox(&self) -> Vec<AuctionEvent> {
        self.outbox.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuctionRepository for InMemoryAuctionRepository {
    async fn insert(&self, auction: &Auction, event: &AuctionEvent) -> Result<(), AppError> {
        let mut auctions = self.auctions.lock().unwrap();
        auctions.insert(auction.id, auction.clone());
        self.outbox.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Auction>, AppError> {
        Ok(self.auctions.lock().unwrap().get(&id).cloned())
    }

    fn list(&self, filter: AuctionFilter) -> BoxStream<'_, Result<Auction, AppError>> {
        let mut auctions: Vec<Auction> = self
            .auctions
            .lock()
            .unwrap()
            .values()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        auctions.sort_by(|a, b| a.make.cmp(&b.make).then(a.id.cmp(&b.id)));
        stream::iter(auctions.into_iter().map(Ok)).boxed()
    }

    async fn update(
        &self,
        auction: &Auction,
        expected_version: i64,
        event: &AuctionEvent,
    ) -> Result<Option<Auction>, AppError> {
        if take_failure(&self.conflicts) {
            return Ok(None);
        }
        let mut auctions = self.auctions.lock().unwrap();
        match auctions.get_mut(&auction.id) {
            Some(stored) if stored.version == expected_version => {
                let mut next = auction.clone();
                next.version = expected_version + 1;
                *stored = next.clone();
                self.outbox.lock().unwrap().push(event.clone());
                Ok(Some(next))
            }
            _ => Ok(None),
        }
    }

    async fn delete(
        &self,
        id: Uuid,
        expected_version: i64,
        event: &AuctionEvent,
    ) -> Result<bool, AppError> {
        if take_failure(&self.conflicts) {
            return Ok(false);
        }
        let mut auctions = self.auctions.lock().unwrap();
        match auctions.get(&id) {
            Some(stored) if stored.version == expected_version => {
                auctions.remove(&id);
                self.outbox.lock().unwrap().push(event.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AuctionEvent>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<AuctionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// 브로커 장애 흉내
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Transport("broker unavailable".to_string()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}
// endregion: --- Auctions

// region:    --- Search
/// 툼스톤은 `(version, None)` 으로 보관
#[derive(Default)]
pub struct InMemorySearchRepository {
    items: Mutex<HashMap<Uuid, (i64, Option<SearchItem>)>>,
    failures: AtomicU32,
}

impl InMemorySearchRepository {
    /// 다음 `n` 번의 쓰기를 저장소 오류로 처리
    pub fn fail_next_writes(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.items
            .lock()
            .unwrap()
            .values()
            .filter(|(_, item)| item.is_some())
            .count()
    }

    fn check_failure(&self) -> Result<(), AppError> {
        if take_failure(&self.failures) {
            return Err(AppError::Store(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchRepository for InMemorySearchRepository {
    async fn upsert_if_newer(&self, item: &SearchItem) -> Result<bool, AppError> {
        self.check_failure()?;
        let mut items = self.items.lock().unwrap();
        match items.get(&item.id) {
            Some((version, _)) if *version >= item.version => Ok(false),
            _ => {
                items.insert(item.id, (item.version, Some(item.clone())));
                Ok(true)
            }
        }
    }

    async fn tombstone_if_newer(&self, id: Uuid, version: i64) -> Result<bool, AppError> {
        self.check_failure()?;
        let mut items = self.items.lock().unwrap();
        match items.get(&id) {
            Some((stored, _)) if *stored >= version => Ok(false),
            _ => {
                items.insert(id, (version, None));
                Ok(true)
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<SearchItem>, AppError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|(_, item)| item.clone()))
    }

    async fn search(
        &self,
        query: &SearchQuery,
        now: DateTime<Utc>,
    ) -> Result<SearchPage, AppError> {
        let mut matches: Vec<SearchItem> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter_map(|(_, item)| item.clone())
            .filter(|item| query.filter.matches(item.auction_end, now))
            .filter(|item| query.seller.as_ref().map_or(true, |s| &item.seller == s))
            .filter(|item| {
                query
                    .winner
                    .as_ref()
                    .map_or(true, |w| item.winner.as_ref() == Some(w))
            })
            .filter(|item| {
                query.search_term.as_ref().map_or(true, |term| {
                    format!("{} {} {}", item.make, item.model, item.color)
                        .to_lowercase()
                        .contains(&term.to_lowercase())
                })
            })
            .collect();

        match query.order {
            SearchOrder::Make => matches.sort_by(|a, b| a.make.cmp(&b.make)),
            SearchOrder::New => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SearchOrder::AuctionEnd => matches.sort_by(|a, b| a.auction_end.cmp(&b.auction_end)),
        }

        let total = matches.len() as i64;
        let page = matches
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .collect();
        Ok(SearchPage::new(page, total, query.page_size))
    }

    async fn latest_updated_at(&self) -> Result<Option<DateTime<Utc>>, AppError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter_map(|(_, item)| item.as_ref().map(|i| i.updated_at))
            .max())
    }
}

#[derive(Default)]
pub struct RecordingDeadLetters {
    parked: Mutex<Vec<(ReceivedMessage, String)>>,
}

impl RecordingDeadLetters {
    pub fn parked(&self) -> Vec<(ReceivedMessage, String)> {
        self.parked.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeadLetterSink for RecordingDeadLetters {
    async fn park(&self, message: &ReceivedMessage, reason: &str) -> Result<(), AppError> {
        self.parked
            .lock()
            .unwrap()
            .push((message.clone(), reason.to_string()));
        Ok(())
    }
}
// endregion: --- Search
