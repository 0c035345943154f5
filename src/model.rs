// Catalogue and search data model

use chrono::{Days, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize, Serializer};

use crate::validation::{FieldError, ValidationFailure};

// Scale used when a price leaves the crate
pub const DISPLAY_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotel {
    // Only hotels created through the catalogue store carry an id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
}

// A bucket of identical rooms within one contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomType {
    #[serde(skip)]
    pub id: u64,
    #[serde(skip)]
    pub contract_id: u64,
    pub type_name: String,
    pub per_person_price: Decimal,
    pub no_of_rooms: u32,
    #[serde(rename = "maxNoOfAdults")]
    pub max_adults: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub id: u64,
    pub hotel: Hotel,
    pub valid_from: NaiveDate,
    // Inclusive
    pub valid_to: NaiveDate,
    // Percentage, e.g. 10 means +10%
    pub markup_rate: Decimal,
    pub room_types: Vec<RoomType>,
}

impl Contract {
    // Both ends inclusive; an inverted window covers nothing
    pub fn covers(&self, check_in: NaiveDate, check_out: NaiveDate) -> bool {
        if self.valid_from > self.valid_to {
            return false;
        }
        self.valid_from <= check_in && self.valid_to >= check_out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRequest {
    pub number_of_rooms: u32,
    pub number_of_adults: u32,
}

impl RoomRequest {
    pub fn new(number_of_rooms: u32, number_of_adults: u32) -> Self {
        Self {
            number_of_rooms,
            number_of_adults,
        }
    }
}

// Only built through StayRequest::new, so every instance is valid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayRequest {
    check_in: NaiveDate,
    check_out: NaiveDate,
    number_of_nights: u32,
    room_requests: Vec<RoomRequest>,
}

impl StayRequest {
    pub fn new(
        check_in: NaiveDate,
        number_of_nights: u32,
        room_requests: Vec<RoomRequest>,
    ) -> Result<Self, ValidationFailure> {
        let mut errors = Vec::new();

        if number_of_nights == 0 {
            errors.push(FieldError::new(
                "numberOfNights",
                "Number of nights must be greater than 0",
            ));
        }

        if room_requests.is_empty() {
            errors.push(FieldError::new(
                "roomRequests",
                "At least one room request is required",
            ));
        }

        for (index, request) in room_requests.iter().enumerate() {
            if request.number_of_rooms == 0 {
                errors.push(FieldError::new(
                    format!("roomRequests[{index}].numberOfRooms"),
                    "Number of rooms must be greater than 0",
                ));
            }
            if request.number_of_adults == 0 {
                errors.push(FieldError::new(
                    format!("roomRequests[{index}].numberOfAdults"),
                    "Number of adults must be greater than 0",
                ));
            }
        }

        let check_out = check_in.checked_add_days(Days::new(u64::from(number_of_nights)));
        if check_out.is_none() {
            errors.push(FieldError::new(
                "numberOfNights",
                "Stay ends outside the supported calendar range",
            ));
        }

        match check_out {
            Some(check_out) if errors.is_empty() => Ok(Self {
                check_in,
                check_out,
                number_of_nights,
                room_requests,
            }),
            _ => Err(ValidationFailure::new(errors)),
        }
    }

    pub fn check_in(&self) -> NaiveDate {
        self.check_in
    }

    // check_in + number_of_nights
    pub fn check_out(&self) -> NaiveDate {
        self.check_out
    }

    pub fn number_of_nights(&self) -> u32 {
        self.number_of_nights
    }

    pub fn room_requests(&self) -> &[RoomRequest] {
        &self.room_requests
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvailabilityStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub hotel_name: String,
    pub availability_status: AvailabilityStatus,
    // Exact; rounded only when serialized
    #[serde(serialize_with = "serialize_display_price")]
    pub price: Decimal,
    // One entry per requested room group, in request order
    pub room_type: Option<Vec<RoomType>>,
}

impl SearchResult {
    pub fn available(hotel_name: impl Into<String>, price: Decimal, room_types: Vec<RoomType>) -> Self {
        Self {
            hotel_name: hotel_name.into(),
            availability_status: AvailabilityStatus::Available,
            price,
            room_type: Some(room_types),
        }
    }

    pub fn unavailable(hotel_name: impl Into<String>) -> Self {
        Self {
            hotel_name: hotel_name.into(),
            availability_status: AvailabilityStatus::Unavailable,
            price: Decimal::ZERO,
            room_type: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.availability_status == AvailabilityStatus::Available
    }

    pub fn display_price(&self) -> Decimal {
        display_price(self.price)
    }
}

// Round half-up to two fractional digits, always rendering both digits
pub fn display_price(price: Decimal) -> Decimal {
    let mut rounded =
        price.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(DISPLAY_SCALE);
    rounded
}

fn serialize_display_price<S>(price: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    rust_decimal::serde::arbitrary_precision::serialize(&display_price(*price), serializer)
}
