use crate::models::payout::Amount;

/// Household share of a recycler bid, in percent. The municipality gets the rest.
pub const USER_SHARE_PCT: u64 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevenueSplit {
    pub total: Amount,
    pub user_share: Amount,
    pub municipality_share: Amount,
}

/// Splits a bid 40/60. The user share is rounded down to the paisa and any
/// remainder goes to the municipality, so the two shares always sum to the bid.
pub fn split(total: Amount) -> RevenueSplit {
    let user_minor = (total.minor() as u128 * USER_SHARE_PCT as u128 / 100) as u64;
    let municipality_minor = total.minor() - user_minor;

    RevenueSplit {
        total,
        user_share: Amount::from_minor(user_minor),
        municipality_share: Amount::from_minor(municipality_minor),
    }
}

#[cfg(test)]
mod tests {
    use super::split;
    use crate::models::payout::Amount;

    #[test]
    fn round_bid_splits_forty_sixty() {
        let result = split(Amount::from_major(100.0).unwrap());
        assert_eq!(result.user_share, Amount::from_minor(4_000));
        assert_eq!(result.municipality_share, Amount::from_minor(6_000));
    }

    #[test]
    fn odd_paise_go_to_municipality() {
        let result = split(Amount::from_minor(1));
        assert_eq!(result.user_share, Amount::ZERO);
        assert_eq!(result.municipality_share, Amount::from_minor(1));

        let result = split(Amount::from_minor(12_347));
        assert_eq!(result.user_share.minor(), 4_938);
        assert_eq!(result.municipality_share.minor(), 7_409);
    }

    #[test]
    fn shares_always_sum_to_total() {
        for minor in [0, 1, 3, 7, 99, 250, 1_001, 33_333, u64::MAX] {
            let result = split(Amount::from_minor(minor));
            assert_eq!(
                result.user_share.minor() + result.municipality_share.minor(),
                minor
            );
        }
    }
}
