// Availability search engine
//
// Pure and synchronous: reads a contract snapshot, allocates only
// request-local state, and never fails for a well-formed request.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, trace, warn};

use crate::combinations::CartesianProduct;
use crate::model::{Contract, RoomRequest, RoomType, SearchResult, StayRequest};

// One result per contract, stable-sorted by exact price
pub fn search(request: &StayRequest, contracts: &[Contract]) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = contracts
        .iter()
        .map(|contract| evaluate_contract(request, contract))
        .collect();

    results.sort_by(|a, b| a.price.cmp(&b.price));
    results
}

pub fn evaluate_contract(request: &StayRequest, contract: &Contract) -> SearchResult {
    let hotel_name = contract.hotel.name.as_str();

    if !contract.covers(request.check_in(), request.check_out()) {
        debug!(
            contract_id = contract.id,
            hotel = hotel_name,
            valid_from = %contract.valid_from,
            valid_to = %contract.valid_to,
            "Contract does not cover the stay"
        );
        return SearchResult::unavailable(hotel_name);
    }

    let buckets = capacity_buckets(contract);
    let combinations = CartesianProduct::new(&buckets);
    trace!(
        contract_id = contract.id,
        buckets = buckets.len(),
        combinations = combinations.len_hint(),
        "Enumerating room type combinations"
    );

    let mut best: Option<(Decimal, Vec<RoomType>)> = None;

    for combination in combinations {
        let Some((total, used)) = price_combination(request, contract, &combination) else {
            continue;
        };

        let cheaper = best
            .as_ref()
            .map_or(true, |(best_total, _)| total < *best_total);
        if cheaper {
            best = Some((total, used.into_iter().cloned().collect()));
        }
    }

    match best {
        Some((price, room_types)) => {
            debug!(contract_id = contract.id, hotel = hotel_name, %price, "Contract available");
            SearchResult::available(hotel_name, price, room_types)
        }
        None => {
            debug!(contract_id = contract.id, hotel = hotel_name, "No feasible combination");
            SearchResult::unavailable(hotel_name)
        }
    }
}

// Ascending by capacity; contract order within a bucket
pub fn capacity_buckets(contract: &Contract) -> Vec<Vec<&RoomType>> {
    let mut buckets: BTreeMap<u32, Vec<&RoomType>> = BTreeMap::new();
    for room_type in &contract.room_types {
        buckets.entry(room_type.max_adults).or_default().push(room_type);
    }
    buckets.into_values().collect()
}

// Greedy first-match of every room group against one combination.
// Returns the total and the room type chosen for each group, in group order,
// or None if some group has no match.
fn price_combination<'a>(
    request: &StayRequest,
    contract: &Contract,
    combination: &[&&'a RoomType],
) -> Option<(Decimal, Vec<&'a RoomType>)> {
    let mut total = Decimal::ZERO;
    let mut used: Vec<usize> = Vec::with_capacity(request.room_requests().len());

    for room_request in request.room_requests() {
        let position = match_room_type(combination, room_request, &used)?;
        used.push(position);

        let room_type: &RoomType = combination[position];
        let Some(running_total) = group_price(
            room_type,
            room_request,
            request.number_of_nights(),
            contract.markup_rate,
        )
        .and_then(|price| total.checked_add(price)) else {
            warn!(
                contract_id = contract.id,
                room_type = %room_type.type_name,
                "Price overflowed; skipping combination"
            );
            return None;
        };
        total = running_total;
    }

    let chosen = used.into_iter().map(|position| *combination[position]).collect();
    Some((total, chosen))
}

// First room type with the exact capacity and enough rooms, preferring one
// not yet claimed by an earlier group
fn match_room_type(
    combination: &[&&RoomType],
    room_request: &RoomRequest,
    used: &[usize],
) -> Option<usize> {
    let mut candidates = combination.iter().enumerate().filter(|(_, room_type)| {
        room_type.max_adults == room_request.number_of_adults
            && room_type.no_of_rooms >= room_request.number_of_rooms
    });

    let first = candidates.next()?;
    if !used.contains(&first.0) {
        return Some(first.0);
    }

    let unused = candidates.find(|(position, _)| !used.contains(position));
    Some(unused.map_or(first.0, |(position, _)| position))
}

// perPersonPrice * adults * rooms * nights * (1 + markup / 100), None on overflow
pub fn group_price(
    room_type: &RoomType,
    room_request: &RoomRequest,
    number_of_nights: u32,
    markup_rate: Decimal,
) -> Option<Decimal> {
    let markup_factor = markup_rate
        .checked_add(Decimal::ONE_HUNDRED)?
        .checked_div(Decimal::ONE_HUNDRED)?;

    room_type
        .per_person_price
        .checked_mul(Decimal::from(room_request.number_of_adults))?
        .checked_mul(Decimal::from(room_request.number_of_rooms))?
        .checked_mul(Decimal::from(number_of_nights))?
        .checked_mul(markup_factor)
}
