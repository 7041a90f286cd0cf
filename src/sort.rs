use crate::models::{JobListing, SortKey};

/// Orders listings in place. `sort_by` is stable, so ties keep input order.
pub fn sort_listings(listings: &mut [&JobListing], key: SortKey) {
    sort_by_listing(listings, key, |l| *l);
}

/// Same ordering as `sort_listings` for anything that carries a listing.
pub fn sort_by_listing<T>(items: &mut [T], key: SortKey, listing: impl Fn(&T) -> &JobListing) {
    match key {
        SortKey::Latest => items.sort_by(|a, b| listing(b).posted_at.cmp(&listing(a).posted_at)),
        SortKey::Oldest => items.sort_by(|a, b| listing(a).posted_at.cmp(&listing(b).posted_at)),
        SortKey::SalaryHigh => items.sort_by(|a, b| listing(b).salary.max.cmp(&listing(a).salary.max)),
        SortKey::SalaryLow => items.sort_by(|a, b| listing(a).salary.min.cmp(&listing(b).salary.min)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_listings;

    fn titles(listings: &[&JobListing]) -> Vec<String> {
        listings.iter().map(|l| l.title.clone()).collect()
    }

    #[test]
    fn oldest_reverses_sample_dates() {
        let all = sample_listings();
        let mut refs: Vec<&JobListing> = all.iter().collect();
        sort_listings(&mut refs, SortKey::Oldest);
        assert_eq!(refs.first().unwrap().title, "HR Generalist");
        assert_eq!(refs.last().unwrap().title, "Senior Software Engineer");
    }

    #[test]
    fn salary_low_orders_by_minimum() {
        let all = sample_listings();
        let mut refs: Vec<&JobListing> = all.iter().collect();
        sort_listings(&mut refs, SortKey::SalaryLow);
        assert_eq!(
            titles(&refs),
            vec![
                "HR Generalist",
                "Frontend Developer",
                "Marketing Manager",
                "Product Designer",
                "Data Scientist",
                "Senior Software Engineer",
            ]
        );
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let mut all = sample_listings();
        for l in all.iter_mut() {
            l.posted_at = same_date();
            l.salary.min = 5_000_000;
            l.salary.max = 10_000_000;
        }
        let input: Vec<&JobListing> = all.iter().collect();
        for key in SortKey::ALL {
            let mut refs = input.clone();
            sort_listings(&mut refs, key);
            assert_eq!(titles(&refs), titles(&input), "{key:?}");
        }
    }

    #[test]
    fn projection_sorts_indexed_pairs() {
        let all = sample_listings();
        let mut pairs: Vec<(usize, &JobListing)> = all.iter().enumerate().collect();
        sort_by_listing(&mut pairs, SortKey::Oldest, |p| p.1);
        let order: Vec<usize> = pairs.iter().map(|p| p.0).collect();
        assert_eq!(order, vec![5, 4, 3, 2, 1, 0]);
    }

    fn same_date() -> chrono::DateTime<chrono::Utc> {
        chrono::DateTime::from_timestamp(1_704_067_200, 0).unwrap()
    }
}
