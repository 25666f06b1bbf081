//! Pagination and sorting requests.
//!
//! Pages are zero-based. Sorting is restricted to a fixed set of columns so a
//! sort clause can be rendered into SQL without binding.

use std::str::FromStr;

/// Default page size when the client does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A sortable product column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Id,
    Name,
    Price,
}

impl SortField {
    /// Column name in `shop.product`.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A `field[,direction]` sort specification, e.g. `price,desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

/// The sort parameter names an unknown field or direction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sort parameter: {0}")]
pub struct SortParseError(pub String);

impl FromStr for Sort {
    type Err = SortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',').map(str::trim);

        let field = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("id") => SortField::Id,
            Some("name") => SortField::Name,
            Some("price") => SortField::Price,
            _ => return Err(SortParseError(s.to_owned())),
        };

        let direction = match parts.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("asc") => SortDirection::Asc,
            Some("desc") => SortDirection::Desc,
            Some(_) => return Err(SortParseError(s.to_owned())),
        };

        if parts.next().is_some() {
            return Err(SortParseError(s.to_owned()));
        }

        Ok(Self { field, direction })
    }
}

/// A request for one page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page number.
    pub page: u32,
    /// Page size, clamped to `1..=MAX_PAGE_SIZE`.
    pub size: u32,
    pub sort: Sort,
}

impl PageRequest {
    /// Build a page request, clamping the size into the allowed range.
    #[must_use]
    pub fn new(page: u32, size: u32, sort: Sort) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
            sort,
        }
    }

    /// Rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page as u64 * self.size as u64
    }

    /// Number of pages needed for `total` rows.
    #[must_use]
    pub fn total_pages(&self, total: u64) -> u32 {
        u32::try_from(total.div_ceil(u64::from(self.size))).unwrap_or(u32::MAX)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(0, DEFAULT_PAGE_SIZE, Sort::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parses_field_and_direction() {
        assert_eq!(
            "price,desc".parse::<Sort>().unwrap(),
            Sort {
                field: SortField::Price,
                direction: SortDirection::Desc,
            }
        );
        assert_eq!(
            "Name".parse::<Sort>().unwrap(),
            Sort {
                field: SortField::Name,
                direction: SortDirection::Asc,
            }
        );
    }

    #[test]
    fn test_sort_rejects_unknown_columns() {
        assert!("description".parse::<Sort>().is_err());
        assert!("name;drop table".parse::<Sort>().is_err());
        assert!("name,sideways".parse::<Sort>().is_err());
        assert!("name,asc,extra".parse::<Sort>().is_err());
    }

    #[test]
    fn test_page_size_is_clamped() {
        assert_eq!(PageRequest::new(0, 0, Sort::default()).size, 1);
        assert_eq!(PageRequest::new(0, 5000, Sort::default()).size, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_offset_and_total_pages() {
        let page = PageRequest::new(2, 12, Sort::default());
        assert_eq!(page.offset(), 24);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(12), 1);
        assert_eq!(page.total_pages(13), 2);
    }
}
