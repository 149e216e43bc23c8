pub trait ResourceID {
    fn resource_id() -> &'static str;
}

macro_rules! resource_id {
    ($type:ty, $resource_name:literal) => {
        impl crate::base::ResourceID for $type {
            fn resource_id() -> &'static str {
                $resource_name
            }
        }
    };
}

pub(crate) use resource_id;

resource_id!(i64, "base::i64");
resource_id!(String, "base::string");

/// Page of a listing, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub per_page: i64,
}

impl Pagination {
    pub const PER_PAGE: i64 = 20;
    pub const MAX_PER_PAGE: i64 = 100;

    pub fn new(page: Option<i64>, per_page: Option<i64>, default_per_page: i64) -> Self {
        Self {
            page: page.filter(|page| *page > 0).unwrap_or(1),
            per_page: per_page
                .filter(|size| *size > 0)
                .unwrap_or(default_per_page)
                .min(Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Number of pages needed for `total` rows.
    pub fn pages(&self, total: i64) -> i64 {
        total / self.per_page + i64::from(total % self.per_page != 0)
    }
}

/// Round a currency amount to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round2(2.346), 2.35);
        assert_eq!(round2(1.0 / 3.0), 0.33);
        assert_eq!(round2(12.0), 12.0);
    }

    #[test]
    fn pagination_bounds() {
        let page = Pagination::new(Some(3), Some(10), Pagination::PER_PAGE);
        assert_eq!(page.offset(), 20);
        assert_eq!(page.pages(0), 0);
        assert_eq!(page.pages(10), 1);
        assert_eq!(page.pages(21), 3);

        let page = Pagination::new(Some(0), None, 10);
        assert_eq!(page, Pagination { page: 1, per_page: 10 });
    }

    #[test]
    fn oversized_paging_values() {
        let page = Pagination::new(Some(i64::MAX), Some(i64::MAX), Pagination::PER_PAGE);
        assert_eq!(page.per_page, Pagination::MAX_PER_PAGE);
        assert_eq!(page.offset(), i64::MAX);
        assert_eq!(page.pages(i64::MAX), i64::MAX / 100 + 1);
        assert_eq!(page.pages(250), 3);
    }
}
