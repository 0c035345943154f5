// Contract catalogue: read access for search, management for operators

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, info};

use crate::model::{Contract, Hotel, RoomType};

#[derive(Error, Debug)]
pub enum CatalogueError {
    #[error("Catalogue unavailable: {0}")]
    Unavailable(String),

    #[error("Catalogue returned {status_code}: {message}")]
    UnexpectedStatus { status_code: u16, message: String },

    #[error("Catalogue response could not be decoded: {0}")]
    Decode(String),

    #[error("Contract {0} not found")]
    ContractNotFound(u64),
}

// Read-only access used by the search engine
#[async_trait]
pub trait ContractCatalogue: Send + Sync + 'static {
    // Every contract, fully populated with its hotel and room types
    async fn list_all_contracts(&self) -> Result<Vec<Contract>, CatalogueError>;
}

// Management surface for operators
#[async_trait]
pub trait ContractStore: ContractCatalogue {
    // Hotel is looked up by name and created on first use
    async fn add_contract(&self, contract: NewContract) -> Result<Contract, CatalogueError>;

    async fn delete_contract(&self, contract_id: u64) -> Result<(), CatalogueError>;

    async fn find_hotel_by_name(&self, name: &str) -> Result<Option<Hotel>, CatalogueError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewContract {
    pub hotel_name: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
    pub markup_rate: Decimal,
    pub room_types: Vec<NewRoomType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRoomType {
    pub type_name: String,
    pub per_person_price: Decimal,
    pub no_of_rooms: u32,
    pub max_adults: u32,
}

// Ids start at 1; contracts are listed in ascending id order
pub struct InMemoryCatalogue {
    contracts: DashMap<u64, Contract>,
    hotels_by_name: DashMap<String, Hotel>,
    contract_counter: AtomicU64,
    hotel_counter: AtomicU64,
    room_type_counter: AtomicU64,
}

impl InMemoryCatalogue {
    pub fn new() -> Self {
        Self {
            contracts: DashMap::new(),
            hotels_by_name: DashMap::new(),
            contract_counter: AtomicU64::new(1),
            hotel_counter: AtomicU64::new(1),
            room_type_counter: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }

    // Atomic per name: concurrent callers with the same name share one hotel
    fn hotel_for(&self, name: &str) -> Hotel {
        self.hotels_by_name
            .entry(name.to_string())
            .or_insert_with(|| {
                let id = self.hotel_counter.fetch_add(1, Ordering::SeqCst);
                info!(hotel_id = id, hotel = name, "Registered hotel");
                Hotel {
                    id: Some(id),
                    name: name.to_string(),
                }
            })
            .clone()
    }
}

impl Default for InMemoryCatalogue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractCatalogue for InMemoryCatalogue {
    async fn list_all_contracts(&self) -> Result<Vec<Contract>, CatalogueError> {
        let mut contracts: Vec<Contract> = self
            .contracts
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        contracts.sort_by_key(|contract| contract.id);
        Ok(contracts)
    }
}

#[async_trait]
impl ContractStore for InMemoryCatalogue {
    async fn add_contract(&self, contract: NewContract) -> Result<Contract, CatalogueError> {
        let hotel = self.hotel_for(&contract.hotel_name);
        let contract_id = self.contract_counter.fetch_add(1, Ordering::SeqCst);

        let room_types = contract
            .room_types
            .into_iter()
            .map(|room_type| RoomType {
                id: self.room_type_counter.fetch_add(1, Ordering::SeqCst),
                contract_id,
                type_name: room_type.type_name,
                per_person_price: room_type.per_person_price,
                no_of_rooms: room_type.no_of_rooms,
                max_adults: room_type.max_adults,
            })
            .collect();

        let stored = Contract {
            id: contract_id,
            hotel,
            valid_from: contract.valid_from,
            valid_to: contract.valid_to,
            markup_rate: contract.markup_rate,
            room_types,
        };
        self.contracts.insert(contract_id, stored.clone());

        debug!(
            contract_id,
            hotel = %stored.hotel.name,
            room_types = stored.room_types.len(),
            "Stored contract"
        );
        Ok(stored)
    }

    async fn delete_contract(&self, contract_id: u64) -> Result<(), CatalogueError> {
        self.contracts
            .remove(&contract_id)
            .ok_or(CatalogueError::ContractNotFound(contract_id))?;
        debug!(contract_id, "Deleted contract");
        Ok(())
    }

    async fn find_hotel_by_name(&self, name: &str) -> Result<Option<Hotel>, CatalogueError> {
        Ok(self.hotels_by_name.get(name).map(|hotel| hotel.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_contract(hotel_name: &str) -> NewContract {
        NewContract {
            hotel_name: hotel_name.to_string(),
            valid_from: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            valid_to: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
            markup_rate: Decimal::new(15, 0),
            room_types: vec![
                NewRoomType {
                    type_name: "Double".to_string(),
                    per_person_price: Decimal::new(9950, 2),
                    no_of_rooms: 4,
                    max_adults: 2,
                },
                NewRoomType {
                    type_name: "Single".to_string(),
                    per_person_price: Decimal::new(7000, 2),
                    no_of_rooms: 2,
                    max_adults: 1,
                },
            ],
        }
    }

    #[test]
    fn test_add_contract_assigns_ids() {
        let catalogue = InMemoryCatalogue::new();
        let stored = tokio_test::block_on(catalogue.add_contract(new_contract("Seaside"))).unwrap();

        assert_eq!(stored.id, 1);
        assert_eq!(stored.hotel.id, Some(1));
        assert_eq!(stored.room_types.len(), 2);
        assert!(stored.room_types.iter().all(|r| r.contract_id == stored.id));
        assert_ne!(stored.room_types[0].id, stored.room_types[1].id);
        assert_eq!(catalogue.len(), 1);
    }

    #[test]
    fn test_hotels_are_shared_by_name() {
        let catalogue = InMemoryCatalogue::new();
        let first = tokio_test::block_on(catalogue.add_contract(new_contract("Seaside"))).unwrap();
        let second = tokio_test::block_on(catalogue.add_contract(new_contract("Seaside"))).unwrap();
        let other = tokio_test::block_on(catalogue.add_contract(new_contract("Mountain"))).unwrap();

        assert_eq!(first.hotel, second.hotel);
        assert_ne!(first.hotel.id, other.hotel.id);

        let found = tokio_test::block_on(catalogue.find_hotel_by_name("Seaside")).unwrap();
        assert_eq!(found, Some(first.hotel));
        let missing = tokio_test::block_on(catalogue.find_hotel_by_name("Nowhere")).unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_id() {
        let catalogue = InMemoryCatalogue::new();
        for name in ["C", "A", "B", "D"] {
            catalogue.add_contract(new_contract(name)).await.unwrap();
        }

        let listed = catalogue.list_all_contracts().await.unwrap();
        let ids: Vec<u64> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
        assert_eq!(listed[0].hotel.name, "C");
    }

    #[tokio::test]
    async fn test_delete_contract() {
        let catalogue = InMemoryCatalogue::new();
        let stored = catalogue.add_contract(new_contract("Seaside")).await.unwrap();

        catalogue.delete_contract(stored.id).await.unwrap();
        assert!(catalogue.is_empty());

        let err = catalogue.delete_contract(stored.id).await.unwrap_err();
        assert!(matches!(err, CatalogueError::ContractNotFound(id) if id == stored.id));
    }

    #[tokio::test]
    async fn test_concurrent_adds_share_one_hotel() {
        let catalogue = Arc::new(InMemoryCatalogue::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let catalogue = Arc::clone(&catalogue);
            handles.push(tokio::spawn(async move {
                catalogue.add_contract(new_contract("Busy Hotel")).await.unwrap()
            }));
        }

        let mut hotel_ids = Vec::new();
        for handle in handles {
            hotel_ids.push(handle.await.unwrap().hotel.id);
        }

        hotel_ids.dedup();
        assert_eq!(hotel_ids.len(), 1);
        assert_eq!(catalogue.len(), 16);
    }
}
