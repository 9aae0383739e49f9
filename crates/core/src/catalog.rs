//! Catalog search, price range and sorting.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;

/// Anything that can be shown in the product grid.
pub trait Listing {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn price(&self) -> Decimal;
}

/// Sort order for the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Keep the order the backend returned.
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
}

impl ProductSort {
    /// Every option, in the order shown in the sort dropdown.
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::NameAsc,
        Self::NameDesc,
    ];

    /// Query-string key (`price-asc`, `name-desc`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::NameAsc => "name-asc",
            Self::NameDesc => "name-desc",
        }
    }

    /// Label for the sort dropdown.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "Featured",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::NameAsc => "Name: A to Z",
            Self::NameDesc => "Name: Z to A",
        }
    }

    /// Parse a query-string key. Unknown keys fall back to [`ProductSort::Default`].
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        key.parse().unwrap_or_default()
    }
}

impl FromStr for ProductSort {
    type Err = UnknownSortKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == s.trim())
            .ok_or_else(|| UnknownSortKey(s.to_owned()))
    }
}

/// Returned when a sort key is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort key: {0}")]
pub struct UnknownSortKey(pub String);

/// Search text, inclusive price bounds and sort order for the catalog page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Build a filter from raw form values.
    ///
    /// Blank or non-numeric price fields are ignored, as is blank search text.
    #[must_use]
    pub fn from_raw(
        search: Option<&str>,
        min_price: Option<&str>,
        max_price: Option<&str>,
        sort: Option<&str>,
    ) -> Self {
        Self {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            min_price: parse_price(min_price),
            max_price: parse_price(max_price),
            sort: sort.map(ProductSort::from_key).unwrap_or_default(),
        }
    }

    /// Whether any criterion differs from the unfiltered catalog.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.search.is_some()
            || self.min_price.is_some()
            || self.max_price.is_some()
            || self.sort != ProductSort::Default
    }

    /// Whether a single listing passes the search and price criteria.
    #[must_use]
    pub fn matches<L: Listing>(&self, item: &L) -> bool {
        if let Some(needle) = &self.search {
            let needle = needle.to_lowercase();
            let in_name = item.name().to_lowercase().contains(&needle);
            let in_description = item.description().to_lowercase().contains(&needle);
            if !in_name && !in_description {
                return false;
            }
        }
        let price = item.price();
        if self.min_price.is_some_and(|min| price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| price > max) {
            return false;
        }
        true
    }

    /// Filter and sort `items`. The sort is stable.
    #[must_use]
    pub fn apply<L: Listing>(&self, items: Vec<L>) -> Vec<L> {
        let mut kept: Vec<L> = items.into_iter().filter(|item| self.matches(item)).collect();
        match self.sort {
            ProductSort::Default => {}
            ProductSort::PriceAsc => kept.sort_by(|a, b| a.price().cmp(&b.price())),
            ProductSort::PriceDesc => kept.sort_by(|a, b| b.price().cmp(&a.price())),
            ProductSort::NameAsc => kept.sort_by(|a, b| compare_names(a.name(), b.name())),
            ProductSort::NameDesc => kept.sort_by(|a, b| compare_names(b.name(), a.name())),
        }
        kept
    }
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn parse_price(raw: Option<&str>) -> Option<Decimal> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| Decimal::from_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Item {
        name: &'static str,
        description: &'static str,
        price: i64,
    }

    impl Listing for Item {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            self.description
        }
        fn price(&self) -> Decimal {
            Decimal::new(self.price, 0)
        }
    }

    fn catalog() -> Vec<Item> {
        vec![
            Item {
                name: "Mate de calabaza",
                description: "Hand made gourd",
                price: 4500,
            },
            Item {
                name: "bombilla",
                description: "Steel straw for mate",
                price: 1200,
            },
            Item {
                name: "Yerba",
                description: "1 kg bag",
                price: 3000,
            },
            Item {
                name: "Termo",
                description: "Keeps water hot",
                price: 12000,
            },
        ]
    }

    fn names(items: &[Item]) -> Vec<&str> {
        items.iter().map(|i| i.name).collect()
    }

    #[test]
    fn test_default_filter_keeps_backend_order() {
        let result = ProductFilter::default().apply(catalog());
        assert_eq!(names(&result), ["Mate de calabaza", "bombilla", "Yerba", "Termo"]);
    }

    #[test]
    fn test_search_matches_name_or_description_case_insensitive() {
        let filter = ProductFilter::from_raw(Some(" MATE "), None, None, None);
        let result = filter.apply(catalog());
        assert_eq!(names(&result), ["Mate de calabaza", "bombilla"]);
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let filter = ProductFilter::from_raw(None, Some("1200"), Some("4500"), None);
        let result = filter.apply(catalog());
        assert_eq!(names(&result), ["Mate de calabaza", "bombilla", "Yerba"]);
    }

    #[test]
    fn test_blank_and_garbage_bounds_are_ignored() {
        let filter = ProductFilter::from_raw(Some("  "), Some(""), Some("abc"), None);
        assert!(!filter.is_active());
        assert_eq!(filter.apply(catalog()).len(), 4);
    }

    #[test]
    fn test_sort_by_price() {
        let asc = ProductFilter::from_raw(None, None, None, Some("price-asc")).apply(catalog());
        assert_eq!(names(&asc), ["bombilla", "Yerba", "Mate de calabaza", "Termo"]);

        let desc = ProductFilter::from_raw(None, None, None, Some("price-desc")).apply(catalog());
        assert_eq!(names(&desc), ["Termo", "Mate de calabaza", "Yerba", "bombilla"]);
    }

    #[test]
    fn test_sort_by_name_ignores_case() {
        let asc = ProductFilter::from_raw(None, None, None, Some("name-asc")).apply(catalog());
        assert_eq!(names(&asc), ["bombilla", "Mate de calabaza", "Termo", "Yerba"]);

        let desc = ProductFilter::from_raw(None, None, None, Some("name-desc")).apply(catalog());
        assert_eq!(names(&desc), ["Yerba", "Termo", "Mate de calabaza", "bombilla"]);
    }

    #[test]
    fn test_unknown_sort_key_falls_back_to_default() {
        assert_eq!(ProductSort::from_key("cheapest"), ProductSort::Default);
        assert!("cheapest".parse::<ProductSort>().is_err());
        assert_eq!(ProductSort::from_key("name-desc"), ProductSort::NameDesc);
    }

    #[test]
    fn test_filters_combine() {
        let filter = ProductFilter::from_raw(Some("mate"), None, Some("2000"), Some("name-asc"));
        assert!(filter.is_active());
        assert_eq!(names(&filter.apply(catalog())), ["bombilla"]);
    }
}
