//! Streams shipped with the tap
//!
//! Two scopes are served:
//! - `finance/chart-of-account`: cursor-paginated chart-of-account entities
//! - `business/taxonomy`: single-shot business taxonomy entities

use super::descriptor::StreamDescriptor;
use super::registry::StreamRegistry;
use super::schema::{Property, Schema};
use crate::error::ExtractError;

pub const FINANCE_SCOPE: &str = "finance/chart-of-account";
pub const BUSINESS_TAXONOMY_SCOPE: &str = "business/taxonomy";

/// Registry with every built-in stream under its scope.
pub fn builtin_registry() -> Result<StreamRegistry, ExtractError> {
    let mut registry = StreamRegistry::new();
    for descriptor in finance_chart_of_account()? {
        registry.register(FINANCE_SCOPE, descriptor)?;
    }
    for descriptor in business_taxonomy()? {
        registry.register(BUSINESS_TAXONOMY_SCOPE, descriptor)?;
    }
    Ok(registry)
}

fn audit_dates() -> Vec<Property> {
    vec![
        Property::string("effectiveStartDate"),
        Property::string("effectiveEndDate"),
        Property::string("creationDate"),
        Property::string("lastUpdateDate"),
    ]
}

fn schema(mut head: Vec<Property>, tail: Vec<Property>) -> Schema {
    head.extend(tail);
    Schema::new(head)
}

pub fn finance_chart_of_account() -> Result<Vec<StreamDescriptor>, ExtractError> {
    let cost_center = StreamDescriptor::cursor_paginated(
        "costcenter",
        "/finance/chart-of-account/cost-center",
        &["costCenterId"],
        Schema::new(vec![
            Property::string("costCenterId"),
            Property::string("costCenterName"),
            Property::string("legalEntityId"),
            Property::string("geographyId"),
            Property::string("organizationId"),
            Property::string("departmentId"),
            Property::string("functionType"),
            Property::string("marketId"),
            Property::string("marketName"),
            Property::boolean("revenueEligibleFlag"),
            Property::boolean("peopleEligibleFlag"),
            Property::string("peopleAlignmentType"),
            Property::string("effectiveStartDate"),
            Property::string("effectiveEndDate"),
            Property::string("creationDate"),
            Property::string("lastUpdateDate"),
            Property::string("functionId"),
            Property::string("gtmMarketId"),
            Property::string("gtmMarketName"),
            Property::string("gtmCountryRegionId"),
            Property::string("gtmCountryRegionName"),
        ]),
    )?;

    let function = StreamDescriptor::cursor_paginated(
        "function",
        "/finance/chart-of-account/function",
        &["functionId"],
        Schema::new(vec![
            Property::string("functionId"),
            Property::string("functionName"),
            Property::string("functionType"),
            Property::string("functionHierarchy"),
            Property::string("functionHierarchyLevel"),
            Property::string("functionParentId"),
            Property::boolean("peopleEligibleFlag"),
            Property::boolean("revenueEligibleFlag"),
            Property::boolean("postingAllowedFlag"),
            Property::string("plAlignment"),
            Property::string("effectiveStartDate"),
            Property::string("effectiveEndDate"),
            Property::string("creationDate"),
            Property::string("lastUpdateDate"),
            Property::boolean("utilizationEligible"),
            Property::string("peopleAlignmentType"),
            Property::string("workforceTaxonomyId"),
        ]),
    )?;

    let geography = StreamDescriptor::cursor_paginated(
        "geography",
        "/finance/chart-of-account/geography",
        &["geographyId"],
        schema(
            vec![
                Property::string("geographyId"),
                Property::string("geographyName"),
                Property::string("abbreviation"),
                Property::string("geographyHierarchyLevel"),
                Property::string("geographyType"),
                Property::string("geographyParentId"),
                Property::boolean("postingAllowedFlag"),
            ],
            audit_dates(),
        ),
    )?;

    let legal_entity = StreamDescriptor::cursor_paginated(
        "legalentity",
        "/finance/chart-of-account/legal-entity",
        &["legalEntityId"],
        schema(
            vec![
                Property::string("legalEntityName"),
                Property::string("legalEntityId").described("The legal entity's system ID"),
                Property::string("legalEntityContractName"),
                Property::string("legalEntityParentId"),
                Property::string("legalEntityHierarchyLevel"),
                Property::string("legalEntityType"),
                Property::string("operationalEntity"),
                Property::string("abbreviation"),
                Property::boolean("postingAllowedFlag"),
                Property::string("primaryCurrencyCode"),
            ],
            {
                let mut tail = audit_dates();
                tail.push(Property::string("operationalStatus"));
                tail
            },
        ),
    )?;

    let organization = StreamDescriptor::cursor_paginated(
        "organization",
        "/finance/chart-of-account/organization",
        &["organizationId"],
        schema(
            vec![
                Property::string("organizationName"),
                Property::string("organizationId").described("The organizations's system ID"),
                Property::string("abbreviation"),
                Property::string("organizationHierarchyLevel"),
                Property::string("organizationFunctionProfile"),
                Property::string("organizationType"),
                Property::string("organizationType2"),
                Property::string("organizationParentId"),
                Property::boolean("peopleEligibleFlag"),
                Property::boolean("postingAllowedFlag"),
            ],
            audit_dates(),
        ),
    )?;

    Ok(vec![cost_center, function, geography, legal_entity, organization])
}

fn modified_audit() -> Vec<Property> {
    vec![
        Property::string("createdBy"),
        Property::date_time("createdOn"),
        Property::string("modifiedBy"),
        Property::date_time("modifiedOn"),
    ]
}

/// Hierarchical taxonomy entries (L1..L4) shared by most taxonomy types.
fn taxonomy_level_schema(extra: Vec<Property>) -> Schema {
    let mut properties = vec![
        Property::string("enterpriseId"),
        Property::string("name"),
        Property::boolean("isActive"),
        Property::string("parentId"),
        Property::integer("levelNumber"),
        Property::string("levelLabel"),
    ];
    properties.extend(extra);
    properties.extend([
        Property::boolean("isRecruitingEligible"),
        Property::boolean("isPeopleEligible"),
        Property::boolean("isSalesEligible"),
        Property::string("idL1"),
        Property::string("idL2"),
        Property::string("idL3"),
        Property::string("idL4"),
        Property::string("namePath"),
    ]);
    properties.extend(modified_audit());
    Schema::new(properties)
}

pub fn business_taxonomy() -> Result<Vec<StreamDescriptor>, ExtractError> {
    let markets = StreamDescriptor::single_shot(
        "markets",
        "/business/taxonomy/markets?includeInactive=true",
        &["id"],
        schema(
            vec![
                Property::string("name"),
                Property::string("id").described("The Market's system ID"),
                Property::string("abbreviation"),
                Property::boolean("active"),
                Property::string_array("peopleTagAdministrators"),
                Property::string("type"),
                Property::string("leader"),
                Property::string_array("supportedApplications"),
            ],
            modified_audit(),
        ),
    )?;

    let capabilities = StreamDescriptor::single_shot(
        "capabilities",
        "/business/taxonomy/capabilities?includeInactive=true",
        &["id"],
        schema(
            vec![
                Property::string("id").described("The Capability's system ID"),
                Property::string("name"),
                Property::boolean("active"),
                Property::string_array("subcapabilities"),
            ],
            modified_audit(),
        ),
    )?;

    let subcapabilities = StreamDescriptor::single_shot(
        "subcapabilities",
        "/business/taxonomy/subcapabilities?includeInactive=true",
        &["id"],
        schema(
            vec![
                Property::string("id").described("The Subcapability's system ID"),
                Property::string("name"),
                Property::boolean("active"),
                Property::string_array("groups"),
            ],
            modified_audit(),
        ),
    )?;

    let groups = StreamDescriptor::single_shot(
        "groups",
        "/business/taxonomy/groups?includeInactive=true",
        &["id"],
        schema(
            vec![
                Property::string("id").described("The group's system ID"),
                Property::string("name"),
                Property::boolean("active"),
            ],
            modified_audit(),
        ),
    )?;

    let taxonomy_types = StreamDescriptor::single_shot(
        "taxonomy_types",
        "/business/taxonomy/types",
        &["enterpriseId"],
        Schema::new(vec![
            Property::string("enterpriseId"),
            Property::string("name"),
            Property::string("idPrefix"),
            Property::boolean("isActive"),
            Property::string("url"),
            Property::boolean("isWorkforceTaxonomy"),
            Property::integer("levelMax"),
            Property::string("labelL1"),
            Property::string("labelL2"),
            Property::string("labelL3"),
            Property::string("labelL4"),
            Property::date_time("createdOn"),
            Property::string("createdBy"),
            Property::date_time("modifiedOn"),
            Property::string("modifiedBy"),
        ]),
    )?;

    let types_capabilities = StreamDescriptor::single_shot(
        "taxonomy_types_capabilities",
        "/business/taxonomy/types/capabilities",
        &["enterpriseId"],
        taxonomy_level_schema(vec![Property::string("maturity")]),
    )?;

    let types_industries = StreamDescriptor::single_shot(
        "taxonomy_types_industries",
        "/business/taxonomy/types/industries",
        &["enterpriseId"],
        taxonomy_level_schema(Vec::new()),
    )?;

    let types_customer_outcomes = StreamDescriptor::single_shot(
        "taxonomy_types_customer_outcomes",
        "/business/taxonomy/types/customer-outcomes",
        &["enterpriseId"],
        taxonomy_level_schema(Vec::new()),
    )?;

    let types_go_to_market = StreamDescriptor::single_shot(
        "taxonomy_types_go_to_market",
        "/business/taxonomy/types/go-to-market",
        &["enterpriseId"],
        taxonomy_level_schema(Vec::new()),
    )?;

    let types_slalom_geography = StreamDescriptor::single_shot(
        "taxonomy_types_slalom_geography",
        "/business/taxonomy/types/slalom-geography",
        &["enterpriseId"],
        Schema::new(vec![
            Property::string("enterpriseId"),
            Property::string("name"),
            Property::string("nameShort"),
            Property::string("parentId"),
            Property::boolean("isActive"),
            Property::boolean("isRecruitingEligible"),
            Property::boolean("isSalesEligible"),
            Property::boolean("isNearestLocationEligible"),
            Property::integer("levelNumber"),
            Property::string("levelLabel"),
            Property::string("namePath"),
            Property::string("idL1"),
            Property::string("idL2"),
            Property::string("idL3"),
            Property::string("idL4"),
            Property::string("idL5"),
            Property::string("idL6"),
            Property::string("idL7"),
            Property::string("idL8"),
        ]),
    )?;

    Ok(vec![
        markets,
        capabilities,
        subcapabilities,
        groups,
        taxonomy_types,
        types_capabilities,
        types_industries,
        types_customer_outcomes,
        types_go_to_market,
        types_slalom_geography,
    ])
}
