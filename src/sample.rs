use rand::Rng;

use crate::data_types::ColumnType;

const GIVEN_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Claude", "Donald", "Edsger", "Frances", "Grace",
    "John", "Katherine", "Ken", "Leslie", "Margaret", "Niklaus", "Radia", "Tony",
];

const SURNAMES: &[&str] = &[
    "Lovelace", "Turing", "Liskov", "Shannon", "Knuth", "Dijkstra", "Allen",
    "Hopper", "Backus", "Johnson", "Thompson", "Lamport", "Hamilton", "Wirth",
    "Perlman", "Hoare",
];

/// Upper bound (exclusive) for generated number-column values.
const NUMBER_RANGE: i64 = 100;

/// Synthesize a display value for a generated row. Text columns get a
/// plausible person name, number columns a bounded integer rendered as a
/// string (the canonical representation is always the string form).
pub fn sample_value<R: Rng>(column_type: ColumnType, rng: &mut R) -> String {
    match column_type {
        ColumnType::Text => format!(
            "{} {}",
            GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())],
            SURNAMES[rng.gen_range(0..SURNAMES.len())]
        ),
        ColumnType::Number => rng.gen_range(0..NUMBER_RANGE).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::parse_number;

    #[test]
    fn test_number_samples_parse_and_stay_bounded() {
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            let value = sample_value(ColumnType::Number, &mut rng);
            let parsed = parse_number(&value).expect("generated number parses");
            assert!((0.0..100.0).contains(&parsed));
        }
    }

    #[test]
    fn test_text_samples_are_two_words() {
        let mut rng = rand::thread_rng();
        for _ in 0..20 {
            let value = sample_value(ColumnType::Text, &mut rng);
            assert_eq!(value.split_whitespace().count(), 2);
        }
    }
}
