#![forbid(unsafe_code)]

pub mod categorize;
pub mod model;
pub mod report;
pub mod tree;
pub mod window;

pub mod ids {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    /// Opaque 128-bit identifier assigned to an activity event by the source system.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct TransactionId(Uuid);

    impl TransactionId {
        pub fn new_random() -> Self {
            Self(Uuid::new_v4())
        }

        pub fn parse(value: &str) -> Result<Self, TransactionIdError> {
            let value = value.trim();
            if value.is_empty() {
                return Err(TransactionIdError::Empty);
            }
            Uuid::parse_str(value)
                .map(Self)
                .map_err(|_| TransactionIdError::Invalid)
        }

        /// Lowercase hyphenated form, the representation persisted in the store.
        pub fn to_canonical(&self) -> String {
            self.0.hyphenated().to_string()
        }
    }

    impl std::fmt::Display for TransactionId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0.hyphenated())
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum TransactionIdError {
        Empty,
        Invalid,
    }
}

pub mod paging {
    use serde::Serialize;

    pub const DEFAULT_PAGE_SIZE: i64 = 20;
    pub const MAX_PAGE_SIZE: i64 = 100;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Pagination {
        pub page: i64,
        pub page_size: i64,
    }

    impl Pagination {
        /// Out-of-range values snap to the nearest valid value.
        pub fn clamped(page: i64, page_size: i64) -> Self {
            Self {
                page: page.max(1),
                page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            }
        }

        pub fn offset(&self) -> i64 {
            (self.page - 1).saturating_mul(self.page_size)
        }

        pub fn total_pages(&self, total: i64) -> i64 {
            if total <= 0 {
                return 0;
            }
            (total + self.page_size - 1) / self.page_size
        }
    }

    impl Default for Pagination {
        fn default() -> Self {
            Self {
                page: 1,
                page_size: DEFAULT_PAGE_SIZE,
            }
        }
    }
}

pub mod region {
    pub const OTHER: &str = "Other";

    /// Fixed province → region lookup. Province names are matched case-insensitively.
    pub const PROVINCE_REGIONS: &[(&str, &str)] = &[
        ("Aceh", "Sumatera"),
        ("Sumatera Utara", "Sumatera"),
        ("Sumatera Barat", "Sumatera"),
        ("Riau", "Sumatera"),
        ("Kepulauan Riau", "Sumatera"),
        ("Jambi", "Sumatera"),
        ("Sumatera Selatan", "Sumatera"),
        ("Kepulauan Bangka Belitung", "Sumatera"),
        ("Bengkulu", "Sumatera"),
        ("Lampung", "Sumatera"),
        ("DKI Jakarta", "Jawa"),
        ("Jawa Barat", "Jawa"),
        ("Banten", "Jawa"),
        ("Jawa Tengah", "Jawa"),
        ("DI Yogyakarta", "Jawa"),
        ("Jawa Timur", "Jawa"),
        ("Bali", "Bali & Nusa Tenggara"),
        ("Nusa Tenggara Barat", "Bali & Nusa Tenggara"),
        ("Nusa Tenggara Timur", "Bali & Nusa Tenggara"),
        ("Kalimantan Barat", "Kalimantan"),
        ("Kalimantan Tengah", "Kalimantan"),
        ("Kalimantan Selatan", "Kalimantan"),
        ("Kalimantan Timur", "Kalimantan"),
        ("Kalimantan Utara", "Kalimantan"),
        ("Sulawesi Utara", "Sulawesi"),
        ("Gorontalo", "Sulawesi"),
        ("Sulawesi Tengah", "Sulawesi"),
        ("Sulawesi Barat", "Sulawesi"),
        ("Sulawesi Selatan", "Sulawesi"),
        ("Sulawesi Tenggara", "Sulawesi"),
        ("Maluku", "Maluku"),
        ("Maluku Utara", "Maluku"),
        ("Papua", "Papua"),
        ("Papua Barat", "Papua"),
        ("Papua Barat Daya", "Papua"),
        ("Papua Tengah", "Papua"),
        ("Papua Pegunungan", "Papua"),
        ("Papua Selatan", "Papua"),
    ];

    /// The listed spelling of `province`, or `Other` when it is not in the fixed list.
    pub fn canonical_province(province: &str) -> &'static str {
        let province = province.trim();
        PROVINCE_REGIONS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(province))
            .map(|(name, _)| *name)
            .unwrap_or(OTHER)
    }

    pub fn region_for_province(province: &str) -> &'static str {
        let province = province.trim();
        PROVINCE_REGIONS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(province))
            .map(|(_, region)| *region)
            .unwrap_or(OTHER)
    }
}

#[cfg(test)]
mod tests {
    use super::ids::{TransactionId, TransactionIdError};
    use super::paging::Pagination;
    use super::region::{canonical_province, region_for_province};

    #[test]
    fn transaction_id_parses_canonical_and_rejects_garbage() {
        let id = TransactionId::parse(" 6F9619FF-8B86-D011-B42D-00C04FC964FF ").expect("uuid");
        assert_eq!(id.to_canonical(), "6f9619ff-8b86-d011-b42d-00c04fc964ff");
        assert_eq!(TransactionId::parse("  "), Err(TransactionIdError::Empty));
        assert_eq!(
            TransactionId::parse("not-a-uuid"),
            Err(TransactionIdError::Invalid)
        );
    }

    #[test]
    fn pagination_clamps_to_valid_range() {
        assert_eq!(Pagination::clamped(0, 0), Pagination { page: 1, page_size: 1 });
        assert_eq!(
            Pagination::clamped(-4, 500),
            Pagination {
                page: 1,
                page_size: 100
            }
        );
        let page = Pagination::clamped(3, 20);
        assert_eq!(page.offset(), 40);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(41), 3);
        assert_eq!(page.total_pages(40), 2);
    }

    #[test]
    fn provinces_resolve_to_regions_case_insensitively() {
        assert_eq!(region_for_province("jawa barat"), "Jawa");
        assert_eq!(region_for_province("Papua Selatan"), "Papua");
        assert_eq!(region_for_province("Atlantis"), "Other");
        assert_eq!(canonical_province("dki jakarta"), "DKI Jakarta");
        assert_eq!(canonical_province(""), "Other");
    }
}
