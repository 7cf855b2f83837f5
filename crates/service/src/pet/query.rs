//! Listing query model: the free-form query string of the approved-pets
//! listing parsed into a typed filter, sort and page request.

use std::{cmp::Ordering, collections::HashMap, str::FromStr};

use uuid::Uuid;

use super::domain::{Pet, Populate};
use crate::{errors::ServiceError, pagination::Pagination};

/// Fields free-text search may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Name,
    Age,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self { Self { field: SortField::CreatedAt, direction: SortDirection::Asc } }
}

impl FromStr for SortSpec {
    type Err = ServiceError;

    /// Accepts `field` or `field:asc|desc`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = match s.split_once(':') {
            Some((f, d)) => (f, d),
            None => (s, "asc"),
        };
        let field = match field.trim() {
            "createdAt" => SortField::CreatedAt,
            "updatedAt" => SortField::UpdatedAt,
            "name" => SortField::Name,
            "age" => SortField::Age,
            other => return Err(ServiceError::Validation(format!("Unsupported sort field: {other}"))),
        };
        let direction = match direction.trim().to_ascii_lowercase().as_str() {
            "asc" => SortDirection::Asc,
            "desc" => SortDirection::Desc,
            other => return Err(ServiceError::Validation(format!("Unsupported sort direction: {other}"))),
        };
        Ok(Self { field, direction })
    }
}

impl SortSpec {
    /// Ordering used by in-memory listings; ties break on id for stable pages.
    pub fn compare(&self, a: &Pet, b: &Pet) -> Ordering {
        let ord = match self.field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Age => a.age.cmp(&b.age),
        };
        let ord = match self.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        };
        ord.then_with(|| a.id.cmp(&b.id))
    }
}

/// Exact-match filters plus an optional free-text search term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PetFilter {
    pub is_approved: Option<bool>,
    pub is_adopted: Option<bool>,
    pub name: Option<String>,
    pub breed: Option<Uuid>,
    pub owner: Option<Uuid>,
    pub submitted_by: Option<Uuid>,
    pub gender: Option<String>,
    pub search: Option<String>,
    pub search_fields: Vec<SearchField>,
}

impl PetFilter {
    pub fn approved() -> Self { Self { is_approved: Some(true), ..Self::default() } }

    pub fn pending() -> Self { Self { is_approved: Some(false), ..Self::default() } }

    pub fn matches(&self, pet: &Pet) -> bool {
        fn eq<T: PartialEq>(want: &Option<T>, have: &T) -> bool {
            want.as_ref().map_or(true, |w| w == have)
        }
        fn eq_opt<T: PartialEq>(want: &Option<T>, have: &Option<T>) -> bool {
            want.as_ref().map_or(true, |w| have.as_ref() == Some(w))
        }

        eq(&self.is_approved, &pet.is_approved)
            && eq(&self.is_adopted, &pet.is_adopted)
            && eq(&self.name, &pet.name)
            && eq_opt(&self.breed, &pet.breed)
            && eq_opt(&self.owner, &pet.owner)
            && eq_opt(&self.submitted_by, &pet.submitted_by)
            && eq_opt(&self.gender, &pet.gender)
            && self.matches_search(pet)
    }

    fn matches_search(&self, pet: &Pet) -> bool {
        let Some(term) = self.search.as_deref() else { return true };
        let needle = term.to_lowercase();
        self.search_fields.iter().any(|f| match f {
            SearchField::Name => pet.name.to_lowercase().contains(&needle),
        })
    }
}

/// Everything a paginated listing needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PetQuery {
    pub filter: PetFilter,
    pub sort: SortSpec,
    pub pagination: Pagination,
    pub max_per_page: u32,
    pub populate: Vec<Populate>,
}

fn parse_u32(key: &str, raw: &str) -> Result<u32, ServiceError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ServiceError::Validation(format!("{key} must be a positive integer")))
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ServiceError> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ServiceError::Validation(format!("{key} must be true or false"))),
    }
}

fn parse_uuid(key: &str, raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ServiceError::InvalidId(format!("Invalid {key} format")))
}

/// Build the approved-pets listing query from raw query-string pairs.
///
/// `sortBy`, `limit`, `page` and `q` are control keys; every other key is an
/// exact-match filter layered over the approved-only base filter, which
/// cannot be overridden.
pub fn approved_listing(
    params: &HashMap<String, String>,
    listing: &configs::ListingConfig,
) -> Result<PetQuery, ServiceError> {
    let mut filter = PetFilter::approved();
    filter.search_fields = vec![SearchField::Name];
    let mut sort = SortSpec::default();
    let mut pagination = Pagination { page: 1, per_page: listing.default_limit };

    for (key, value) in params {
        match key.as_str() {
            "sortBy" => {
                if !value.trim().is_empty() {
                    sort = value.parse()?;
                }
            }
            "limit" => pagination.per_page = parse_u32(key, value)?,
            "page" => pagination.page = parse_u32(key, value)?,
            "q" => {
                let term = value.trim();
                filter.search = (!term.is_empty()).then(|| term.to_string());
            }
            "name" => filter.name = Some(value.clone()),
            "gender" => filter.gender = Some(value.clone()),
            "breed" => filter.breed = Some(parse_uuid("breed", value)?),
            "owner" => filter.owner = Some(parse_uuid("owner", value)?),
            "submittedBy" => filter.submitted_by = Some(parse_uuid("submittedBy", value)?),
            "isAdopted" => filter.is_adopted = Some(parse_bool(key, value)?),
            other => return Err(ServiceError::Validation(format!("Unsupported filter: {other}"))),
        }
    }

    Ok(PetQuery {
        filter,
        sort,
        pagination,
        max_per_page: listing.max_limit,
        populate: vec![Populate::Owner, Populate::Breed],
    })
}
