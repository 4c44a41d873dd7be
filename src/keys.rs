//! Content Catalogue and Cache Keys
//!
//! Names the site's content collections and engineering departments, and
//! builds cache keys as `resource_qualifier` (`partners_all`,
//! `events_upcoming_3`, `lecturers_department-aerospace`).
//!
//! Keys are a naming convention only: the cache does not namespace them and a
//! collision overwrites silently. Query-derived qualifiers escape their
//! separators so that distinct queries never share a key.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CacheError;

/// Qualifier used when a listing is not filtered.
pub const UNQUALIFIED: &str = "all";

// == Resource ==
/// Content collections served by the site backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Partners,
    Lecturers,
    Events,
    Gallery,
    Executives,
    DepartmentAdmins,
    Courses,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Partners,
        Resource::Lecturers,
        Resource::Events,
        Resource::Gallery,
        Resource::Executives,
        Resource::DepartmentAdmins,
        Resource::Courses,
    ];

    /// Path segment and cache-key prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Partners => "partners",
            Resource::Lecturers => "lecturers",
            Resource::Events => "events",
            Resource::Gallery => "gallery",
            Resource::Executives => "executives",
            Resource::DepartmentAdmins => "department_admins",
            Resource::Courses => "courses",
        }
    }

    /// Query parameters the upstream listing understands.
    pub fn query_keys(self) -> &'static [&'static str] {
        match self {
            Resource::Lecturers => &["department"],
            Resource::Events => &["upcoming", "past"],
            Resource::Gallery => &["type"],
            Resource::Courses => &["lecturer_id", "level"],
            Resource::Partners | Resource::Executives | Resource::DepartmentAdmins => &[],
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resource::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CacheError::UnknownResource(s.to_string()))
    }
}

// == Department ==
/// Engineering departments with lecturer listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Department {
    Aerospace,
    Mechanical,
    Chemical,
    ElectronicsComputer,
    Civil,
    Industrial,
}

impl Department {
    pub const ALL: [Department; 6] = [
        Department::Aerospace,
        Department::Mechanical,
        Department::Chemical,
        Department::ElectronicsComputer,
        Department::Civil,
        Department::Industrial,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Department::Aerospace => "aerospace",
            Department::Mechanical => "mechanical",
            Department::Chemical => "chemical",
            Department::ElectronicsComputer => "electronics-computer",
            Department::Civil => "civil",
            Department::Industrial => "industrial",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Department::Aerospace => "Aerospace Engineering",
            Department::Mechanical => "Mechanical Engineering",
            Department::Chemical => "Chemical Engineering",
            Department::ElectronicsComputer => "Electronics & Computer Engineering",
            Department::Civil => "Civil Engineering",
            Department::Industrial => "Industrial Engineering",
        }
    }

    pub fn abbrev(self) -> &'static str {
        match self {
            Department::Aerospace => "ASE",
            Department::Mechanical => "ME",
            Department::Chemical => "CHE",
            Department::ElectronicsComputer => "ECE",
            Department::Civil => "CVE",
            Department::Industrial => "IE",
        }
    }
}

impl FromStr for Department {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Department::ALL
            .into_iter()
            .find(|d| d.slug() == s)
            .ok_or_else(|| CacheError::InvalidRequest(format!("Unknown department: {}", s)))
    }
}

// == Key Builders ==
/// Builds the cache key for a resource listing.
pub fn cache_key(resource: Resource, qualifier: Option<&str>) -> String {
    match qualifier {
        Some(q) if !q.is_empty() => format!("{}_{}", resource.as_str(), q),
        _ => format!("{}_{}", resource.as_str(), UNQUALIFIED),
    }
}

/// Renders query parameters as a key qualifier: `k-v` pairs in key order
/// joined by `_`. `None` when there are no parameters.
///
/// Keys and values are percent-encoded with `-` and `_` escaped as well, so
/// the separators only ever come from this function.
pub fn query_qualifier(query: &BTreeMap<String, String>) -> Option<String> {
    if query.is_empty() {
        return None;
    }
    let parts: Vec<String> = query
        .iter()
        .map(|(k, v)| format!("{}-{}", escape_component(k), escape_component(v)))
        .collect();
    Some(parts.join("_"))
}

// == Query Validation ==
/// Rejects query parameters the resource does not accept and unknown
/// department slugs.
pub fn validate_query(
    resource: Resource,
    query: &BTreeMap<String, String>,
) -> Result<(), CacheError> {
    let allowed = resource.query_keys();
    if let Some(unknown) = query.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(CacheError::InvalidRequest(format!(
            "Unsupported query parameter for {}: {}",
            resource, unknown
        )));
    }
    if let Some(slug) = query.get("department") {
        slug.parse::<Department>()?;
    }
    Ok(())
}

fn escape_component(raw: &str) -> String {
    urlencoding::encode(raw)
        .replace('-', "%2D")
        .replace('_', "%5F")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>().unwrap(), resource);
        }
    }

    #[test]
    fn test_unknown_resource() {
        assert!(matches!(
            "admin_users".parse::<Resource>(),
            Err(CacheError::UnknownResource(_))
        ));
    }

    #[test]
    fn test_department_lookup() {
        let dept: Department = "electronics-computer".parse().unwrap();
        assert_eq!(dept, Department::ElectronicsComputer);
        assert_eq!(dept.abbrev(), "ECE");
        assert_eq!(dept.name(), "Electronics & Computer Engineering");
        assert!("underwater-basket".parse::<Department>().is_err());
    }

    #[test]
    fn test_cache_key_convention() {
        assert_eq!(cache_key(Resource::Partners, None), "partners_all");
        assert_eq!(cache_key(Resource::Events, Some("upcoming_3")), "events_upcoming_3");
        assert_eq!(cache_key(Resource::Gallery, Some("")), "gallery_all");
    }

    #[test]
    fn test_query_qualifier_is_order_independent() {
        let mut a = BTreeMap::new();
        a.insert("upcoming".to_string(), "true".to_string());
        a.insert("limit".to_string(), "3".to_string());

        let mut b = BTreeMap::new();
        b.insert("limit".to_string(), "3".to_string());
        b.insert("upcoming".to_string(), "true".to_string());

        assert_eq!(query_qualifier(&a), Some("limit-3_upcoming-true".to_string()));
        assert_eq!(query_qualifier(&a), query_qualifier(&b));
        assert_eq!(query_qualifier(&BTreeMap::new()), None);
    }

    fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_separators_in_values_do_not_collide() {
        let smuggled = query(&[("department", "aerospace_limit-3")]);
        let genuine = query(&[("department", "aerospace"), ("limit", "3")]);

        let smuggled_key = cache_key(Resource::Lecturers, query_qualifier(&smuggled).as_deref());
        let genuine_key = cache_key(Resource::Lecturers, query_qualifier(&genuine).as_deref());

        assert_ne!(smuggled_key, genuine_key);
        assert_eq!(genuine_key, "lecturers_department-aerospace_limit-3");
    }

    #[test]
    fn test_qualifier_escapes_reserved_characters() {
        assert_eq!(
            query_qualifier(&query(&[("department", "electronics-computer")])),
            Some("department-electronics%2Dcomputer".to_string())
        );
        assert_eq!(
            query_qualifier(&query(&[("lecturer_id", "a b%")])),
            Some("lecturer%5Fid-a%20b%25".to_string())
        );
    }

    #[test]
    fn test_validate_query_allow_list() {
        assert!(validate_query(Resource::Events, &query(&[("upcoming", "true")])).is_ok());
        assert!(validate_query(
            Resource::Courses,
            &query(&[("lecturer_id", "7"), ("level", "300")])
        )
        .is_ok());
        assert!(validate_query(Resource::Partners, &BTreeMap::new()).is_ok());

        assert!(matches!(
            validate_query(Resource::Events, &query(&[("_", "1718000000")])),
            Err(CacheError::InvalidRequest(_))
        ));
        assert!(matches!(
            validate_query(Resource::Partners, &query(&[("department", "civil")])),
            Err(CacheError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_validate_query_checks_department_slug() {
        assert!(validate_query(Resource::Lecturers, &query(&[("department", "civil")])).is_ok());
        assert!(matches!(
            validate_query(Resource::Lecturers, &query(&[("department", "astrology")])),
            Err(CacheError::InvalidRequest(_))
        ));
    }
}
