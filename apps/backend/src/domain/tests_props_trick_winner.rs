use proptest::prelude::*;

use crate::domain::cards_logic::card_strength;
use crate::domain::tricks::{determine_field_winner, Field};
use crate::domain::{test_gens, test_prelude, Card, Suit};

fn seats(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn field(dealer: &str, cards: &[Card], joker_base: Suit) -> Field {
    let mut f = Field::led_by(dealer);
    for card in cards {
        f.place(*card);
    }
    if f.base_card == Some(Card::Joker) {
        f.base_suit = Some(joker_base);
    }
    f
}

proptest! {
    #![proptest_config(test_prelude::proptest_config())]

    /// Rotating the seat list does not change who wins a trick.
    #[test]
    fn prop_winner_invariant_under_seat_rotation(
        cards in test_gens::four_distinct_cards(),
        trump in test_gens::trump(),
        joker_base in test_gens::suit(),
        dealer in 0usize..4,
        rotation in 0usize..4,
    ) {
        let base = seats(&["a", "b", "c", "d"]);
        let mut rotated = base.clone();
        rotated.rotate_left(rotation);

        let f = field(&base[dealer], &cards, joker_base);
        let w1 = determine_field_winner(&f, &base, Some(trump)).map(str::to_string);
        let w2 = determine_field_winner(&f, &rotated, Some(trump)).map(str::to_string);
        prop_assert!(w1.is_some());
        prop_assert_eq!(w1, w2);
    }

    /// The winner holds the strongest card; the Joker always wins.
    #[test]
    fn prop_winner_has_strongest_card(
        cards in test_gens::four_distinct_cards(),
        trump in test_gens::trump(),
        joker_base in test_gens::suit(),
    ) {
        let order = seats(&["a", "b", "c", "d"]);
        let f = field("a", &cards, joker_base);
        let lead = f.lead_suit(Some(trump));
        let strengths: Vec<u32> = cards.iter().map(|c| card_strength(*c, lead, Some(trump))).collect();
        let max = *strengths.iter().max().unwrap();
        let first_max = strengths.iter().position(|s| *s == max).unwrap();

        let winner = determine_field_winner(&f, &order, Some(trump)).unwrap();
        prop_assert_eq!(winner, order[first_max].as_str());
        if let Some(joker_at) = cards.iter().position(|c| c.is_joker()) {
            prop_assert_eq!(winner, order[joker_at].as_str());
        }
    }
}
