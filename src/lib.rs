// Hotel contract availability search

pub mod catalogue;
pub mod catalogue_client;
pub mod combinations;
pub mod contracts;
pub mod model;
pub mod search;
pub mod service;
pub mod validation;

// Re-export key types for convenience
pub use catalogue::{
    CatalogueError, ContractCatalogue, ContractStore, InMemoryCatalogue, NewContract, NewRoomType,
};
pub use catalogue_client::{CatalogueClientConfig, ClientStats, HttpContractCatalogue, RetryConfig};
pub use contracts::{ContractError, ContractService, HotelContractDto, HotelDto, RoomTypeDto};
pub use model::{
    AvailabilityStatus, Contract, Hotel, RoomRequest, RoomType, SearchResult, StayRequest,
};
pub use service::{SearchConfig, SearchError, SearchService, SearchStatsReport};
pub use validation::{FieldError, RoomRequestPayload, SearchRequestPayload, ValidationFailure};
