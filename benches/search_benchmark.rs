use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hotel_contract_search::search::search;
use hotel_contract_search::{Contract, Hotel, RoomRequest, RoomType, StayRequest};
use rand::{thread_rng, Rng};
use rust_decimal::Decimal;

// Random catalogue where every contract covers the benchmarked stay
fn random_catalogue(contracts: usize, room_types_per_contract: usize) -> Vec<Contract> {
    let mut rng = thread_rng();
    let valid_from = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
    let valid_to = NaiveDate::from_ymd_opt(2030, 12, 31).unwrap();

    (0..contracts)
        .map(|i| {
            let id = i as u64 + 1;
            let room_types = (0..room_types_per_contract)
                .map(|j| RoomType {
                    id: (i * room_types_per_contract + j) as u64 + 1,
                    contract_id: id,
                    type_name: format!("Room {j}"),
                    per_person_price: Decimal::new(rng.gen_range(4000..30000), 2),
                    no_of_rooms: rng.gen_range(0..6),
                    max_adults: rng.gen_range(1..=4),
                })
                .collect();

            Contract {
                id,
                hotel: Hotel {
                    id: Some(id),
                    name: format!("hotel{i}"),
                },
                valid_from,
                valid_to,
                markup_rate: Decimal::new(rng.gen_range(0..3000), 2),
                room_types,
            }
        })
        .collect()
}

pub fn search_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract_search");

    let request = StayRequest::new(
        NaiveDate::from_ymd_opt(2030, 6, 10).unwrap(),
        5,
        vec![
            RoomRequest::new(1, 2),
            RoomRequest::new(1, 1),
            RoomRequest::new(2, 3),
        ],
    )
    .unwrap();

    // Catalogue size against room types per contract
    for (contracts, room_types) in [(10, 8), (100, 8), (100, 24), (1000, 8)] {
        let catalogue = random_catalogue(contracts, room_types);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{contracts}x{room_types}")),
            &catalogue,
            |b, catalogue| b.iter(|| black_box(search(&request, black_box(catalogue)))),
        );
    }

    group.finish();
}

criterion_group!(benches, search_benchmark);
criterion_main!(benches);
