// Contract management surface and its wire format

use std::borrow::Cow;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::catalogue::{CatalogueError, ContractStore, NewContract, NewRoomType};
use crate::model::{Contract, Hotel, RoomType};
use crate::validation::{FieldError, ValidationFailure};

#[derive(Error, Debug)]
pub enum ContractError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("Hotel not found with name: {0}")]
    HotelNotFound(String),

    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HotelContractDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<u64>,

    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Hotel name must not exceed 100 characters")
    )]
    pub hotel_name: String,

    pub valid_from: NaiveDate,

    pub valid_to: NaiveDate,

    #[validate(custom(function = "non_negative_markup"))]
    pub markup_rate: Decimal,

    #[serde(default)]
    #[validate(length(min = 1, message = "At least one room type is required"), nested)]
    pub room_type_list: Vec<RoomTypeDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_id: Option<u64>,

    #[validate(custom(function = "not_blank"))]
    pub type_name: String,

    #[validate(custom(function = "positive_price"))]
    pub per_person_price: Decimal,

    #[serde(default)]
    #[validate(range(min = 1, message = "Number of rooms must be greater than 0"))]
    pub no_of_rooms: i64,

    #[serde(default)]
    #[validate(range(min = 1, message = "Maximum number of adults must be greater than 0"))]
    pub max_no_of_adults: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotel_id: Option<u64>,
    pub hotel_name: String,
}

fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule("blank", "Must not be blank"));
    }
    Ok(())
}

fn non_negative_markup(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(rule("range", "Markup rate must not be negative"));
    }
    Ok(())
}

fn positive_price(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || value.is_zero() {
        return Err(rule("range", "Per person price must be greater than 0"));
    }
    Ok(())
}

impl HotelContractDto {
    // Field rules plus the validity window check
    pub fn check(&self) -> Result<(), ValidationFailure> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => ValidationFailure::from(errors).errors,
        };

        if self.valid_from > self.valid_to {
            errors.push(FieldError::new(
                "validTo",
                "Valid to date must not be before valid from date",
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(errors))
        }
    }

    pub fn into_new_contract(self) -> Result<NewContract, ValidationFailure> {
        let mut room_types = Vec::with_capacity(self.room_type_list.len());
        for (index, room_type) in self.room_type_list.into_iter().enumerate() {
            let path = format!("roomTypeList[{index}]");
            room_types.push(NewRoomType {
                type_name: room_type.type_name,
                per_person_price: room_type.per_person_price,
                no_of_rooms: to_count(room_type.no_of_rooms, &path, "noOfRooms")?,
                max_adults: to_count(room_type.max_no_of_adults, &path, "maxNoOfAdults")?,
            });
        }

        Ok(NewContract {
            hotel_name: self.hotel_name,
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            markup_rate: self.markup_rate,
            room_types,
        })
    }

    // Remote listings are trusted apart from count ranges; no hotel id
    pub fn into_contract(self) -> Result<Contract, ValidationFailure> {
        let contract_id = self.contract_id.unwrap_or_default();

        let mut room_types = Vec::with_capacity(self.room_type_list.len());
        for (index, room_type) in self.room_type_list.into_iter().enumerate() {
            let path = format!("roomTypeList[{index}]");
            room_types.push(RoomType {
                id: 0,
                contract_id: room_type.contract_id.unwrap_or(contract_id),
                type_name: room_type.type_name,
                per_person_price: room_type.per_person_price,
                no_of_rooms: to_count(room_type.no_of_rooms, &path, "noOfRooms")?,
                max_adults: to_count(room_type.max_no_of_adults, &path, "maxNoOfAdults")?,
            });
        }

        Ok(Contract {
            id: contract_id,
            hotel: Hotel {
                id: None,
                name: self.hotel_name,
            },
            valid_from: self.valid_from,
            valid_to: self.valid_to,
            markup_rate: self.markup_rate,
            room_types,
        })
    }
}

fn to_count(value: i64, path: &str, field: &str) -> Result<u32, ValidationFailure> {
    u32::try_from(value)
        .map_err(|_| ValidationFailure::single(format!("{path}.{field}"), "Value is out of range"))
}

impl From<&RoomType> for RoomTypeDto {
    fn from(room_type: &RoomType) -> Self {
        Self {
            contract_id: Some(room_type.contract_id),
            type_name: room_type.type_name.clone(),
            per_person_price: room_type.per_person_price,
            no_of_rooms: i64::from(room_type.no_of_rooms),
            max_no_of_adults: i64::from(room_type.max_adults),
        }
    }
}

impl From<&Contract> for HotelContractDto {
    fn from(contract: &Contract) -> Self {
        Self {
            contract_id: Some(contract.id),
            hotel_name: contract.hotel.name.clone(),
            valid_from: contract.valid_from,
            valid_to: contract.valid_to,
            markup_rate: contract.markup_rate,
            room_type_list: contract.room_types.iter().map(RoomTypeDto::from).collect(),
        }
    }
}

impl From<Hotel> for HotelDto {
    fn from(hotel: Hotel) -> Self {
        Self {
            hotel_id: hotel.id,
            hotel_name: hotel.name,
        }
    }
}

pub struct ContractService<S: ContractStore + ?Sized> {
    store: Arc<S>,
}

impl<S: ContractStore + ?Sized> ContractService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn add_contract(
        &self,
        contract: HotelContractDto,
    ) -> Result<HotelContractDto, ContractError> {
        contract.check()?;
        let stored = self.store.add_contract(contract.into_new_contract()?).await?;

        info!(
            contract_id = stored.id,
            hotel = %stored.hotel.name,
            valid_from = %stored.valid_from,
            valid_to = %stored.valid_to,
            "Contract added"
        );
        Ok(HotelContractDto::from(&stored))
    }

    pub async fn get_contracts(&self) -> Result<Vec<HotelContractDto>, ContractError> {
        let contracts = self.store.list_all_contracts().await?;
        Ok(contracts.iter().map(HotelContractDto::from).collect())
    }

    pub async fn delete_contract(&self, contract_id: u64) -> Result<(), ContractError> {
        self.store.delete_contract(contract_id).await?;
        info!(contract_id, "Contract deleted");
        Ok(())
    }

    pub async fn find_hotel_by_name(&self, name: &str) -> Result<HotelDto, ContractError> {
        self.store
            .find_hotel_by_name(name)
            .await?
            .map(HotelDto::from)
            .ok_or_else(|| ContractError::HotelNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::InMemoryCatalogue;
    use test_case::test_case;

    fn dto_json() -> serde_json::Value {
        serde_json::json!({
            "hotelName": "Lagoon Resort",
            "validFrom": "2030-01-01",
            "validTo": "2030-06-30",
            "markupRate": 12.5,
            "roomTypeList": [
                {"typeName": "Double", "perPersonPrice": "110.00", "noOfRooms": 6, "maxNoOfAdults": 2},
                {"typeName": "Family", "perPersonPrice": 85, "noOfRooms": 2, "maxNoOfAdults": 4}
            ]
        })
    }

    fn dto() -> HotelContractDto {
        serde_json::from_value(dto_json()).unwrap()
    }

    fn service() -> ContractService<InMemoryCatalogue> {
        ContractService::new(Arc::new(InMemoryCatalogue::new()))
    }

    #[tokio::test]
    async fn test_add_and_list_contracts() {
        let service = service();

        let added = service.add_contract(dto()).await.unwrap();
        assert_eq!(added.contract_id, Some(1));
        assert_eq!(added.markup_rate, "12.5".parse::<Decimal>().unwrap());
        assert!(added.room_type_list.iter().all(|r| r.contract_id == Some(1)));

        let listed = service.get_contracts().await.unwrap();
        assert_eq!(listed, vec![added]);
    }

    #[tokio::test]
    async fn test_delete_contract() {
        let service = service();
        let added = service.add_contract(dto()).await.unwrap();
        let id = added.contract_id.unwrap();

        service.delete_contract(id).await.unwrap();
        assert!(service.get_contracts().await.unwrap().is_empty());

        let err = service.delete_contract(id).await.unwrap_err();
        assert!(matches!(
            err,
            ContractError::Catalogue(CatalogueError::ContractNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_find_hotel_by_name() {
        let service = service();
        service.add_contract(dto()).await.unwrap();

        let hotel = service.find_hotel_by_name("Lagoon Resort").await.unwrap();
        assert_eq!(hotel.hotel_name, "Lagoon Resort");
        assert_eq!(hotel.hotel_id, Some(1));

        let err = service.find_hotel_by_name("Unknown").await.unwrap_err();
        assert_eq!(err.to_string(), "Hotel not found with name: Unknown");
    }

    #[tokio::test]
    async fn test_hotel_name_is_stored_as_given() {
        let service = service();
        let mut contract = dto();
        contract.hotel_name = " Lagoon Resort ".to_string();

        let added = service.add_contract(contract).await.unwrap();
        assert_eq!(added.hotel_name, " Lagoon Resort ");

        let hotel = service.find_hotel_by_name(" Lagoon Resort ").await.unwrap();
        assert_eq!(hotel.hotel_name, " Lagoon Resort ");
        assert!(service.find_hotel_by_name("Lagoon Resort").await.is_err());
    }

    #[test_case("hotelName", serde_json::json!("   "), "hotelName"; "blank hotel name")]
    #[test_case("hotelName", serde_json::json!("x".repeat(101)), "hotelName"; "hotel name too long")]
    #[test_case("markupRate", serde_json::json!(-1), "markupRate"; "negative markup")]
    #[test_case("validTo", serde_json::json!("2029-12-31"), "validTo"; "inverted window")]
    #[test_case("roomTypeList", serde_json::json!([]), "roomTypeList"; "no room types")]
    fn test_invalid_contract_rejected(key: &str, value: serde_json::Value, field: &str) {
        let mut json = dto_json();
        json[key] = value;
        let contract: HotelContractDto = serde_json::from_value(json).unwrap();

        let failure = contract.check().unwrap_err();
        assert!(failure.has_field(field), "got {:?}", failure.errors);
    }

    #[test_case("typeName", serde_json::json!(""), "roomTypeList[1].typeName"; "blank type name")]
    #[test_case("perPersonPrice", serde_json::json!(0), "roomTypeList[1].perPersonPrice"; "zero price")]
    #[test_case("noOfRooms", serde_json::json!(0), "roomTypeList[1].noOfRooms"; "zero rooms")]
    #[test_case("maxNoOfAdults", serde_json::json!(-2), "roomTypeList[1].maxNoOfAdults"; "negative adults")]
    fn test_invalid_room_type_rejected(key: &str, value: serde_json::Value, field: &str) {
        let mut json = dto_json();
        json["roomTypeList"][1][key] = value;
        let contract: HotelContractDto = serde_json::from_value(json).unwrap();

        let failure = contract.check().unwrap_err();
        assert!(failure.has_field(field), "got {:?}", failure.errors);
    }

    #[tokio::test]
    async fn test_invalid_contract_is_not_stored() {
        let service = service();
        let mut contract = dto();
        contract.room_type_list.clear();

        let err = service.add_contract(contract).await.unwrap_err();
        assert!(matches!(err, ContractError::Validation(_)));
        assert!(service.get_contracts().await.unwrap().is_empty());
    }

    #[test]
    fn test_remote_listing_converts_to_contract() {
        let mut json = dto_json();
        json["contractId"] = serde_json::json!(42);
        json["roomTypeList"][0]["noOfRooms"] = serde_json::json!(0);
        let contract = serde_json::from_value::<HotelContractDto>(json)
            .unwrap()
            .into_contract()
            .unwrap();

        assert_eq!(contract.id, 42);
        assert_eq!(contract.hotel.id, None);
        assert_eq!(contract.room_types[0].no_of_rooms, 0);
        assert!(contract.room_types.iter().all(|r| r.contract_id == 42));
    }
}
