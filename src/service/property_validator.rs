use std::collections::BTreeMap;

use bigdecimal::BigDecimal;

use crate::dtos::propertydtos::{
    optional_text, CreatePropertyDto, NormalizedCreateProperty, NormalizedPatchProperty,
    UpdatePropertyDto,
};
use crate::models::propertymodel::{ContractType, PropertyStatus};

pub const MAX_TITLE_LEN: usize = 140;
pub const MAX_DESCRIPTION_LEN: usize = 4000;
pub const MAX_CITY_LEN: usize = 120;
pub const MAX_NEIGHBORHOOD_LEN: usize = 120;
pub const MAX_ADDRESS_LEN: usize = 255;

/// Field name -> error messages. Empty map means the payload is valid.
pub type ValidationErrors = BTreeMap<String, Vec<String>>;

pub fn add_error(errors: &mut ValidationErrors, key: &str, message: impl Into<String>) {
    errors.entry(key.to_string()).or_default().push(message.into());
}

/// Validates every field and normalizes in the same pass. All independent
/// violations are reported together, never fail-fast.
pub fn validate_for_create(
    request: &CreatePropertyDto,
) -> Result<NormalizedCreateProperty, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    validate_text(&mut errors, "title", &request.title, MAX_TITLE_LEN, true);
    if let Some(description) = &request.description {
        validate_text(&mut errors, "description", description, MAX_DESCRIPTION_LEN, false);
    }
    validate_text(&mut errors, "city", &request.city, MAX_CITY_LEN, true);
    if let Some(neighborhood) = &request.neighborhood {
        validate_text(&mut errors, "neighborhood", neighborhood, MAX_NEIGHBORHOOD_LEN, false);
    }
    if let Some(address) = &request.address {
        validate_text(&mut errors, "address", address, MAX_ADDRESS_LEN, false);
    }

    validate_numbers(
        &mut errors,
        Some(&request.monthly_price),
        Some(&request.deposit_amount),
        Some(request.bedrooms),
        Some(request.bathrooms),
        Some(&request.area_m2),
    );

    let contract_type = parse_contract_type(&mut errors, &request.contract_type);
    let status = parse_status(&mut errors, &request.status);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NormalizedCreateProperty {
        title: request.title.trim().to_string(),
        description: request.description.as_deref().and_then(optional_text),
        city: request.city.trim().to_string(),
        neighborhood: request.neighborhood.as_deref().and_then(optional_text),
        address: request.address.as_deref().and_then(optional_text),
        monthly_price: request.monthly_price.clone(),
        deposit_amount: request.deposit_amount.clone(),
        bedrooms: request.bedrooms,
        bathrooms: request.bathrooms,
        area_m2: request.area_m2.clone(),
        is_furnished: request.is_furnished,
        available_from: request.available_from,
        contract_type: contract_type.unwrap_or(ContractType::LongTerm),
        status: status.unwrap_or(PropertyStatus::Pendiente),
    })
}

/// Patch mode: only provided fields are checked. An all-absent payload is
/// the caller's problem (`has_any_field` on the result).
pub fn validate_for_patch(
    request: &UpdatePropertyDto,
) -> Result<NormalizedPatchProperty, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Some(title) = &request.title {
        validate_text(&mut errors, "title", title, MAX_TITLE_LEN, true);
    }
    if let Some(description) = &request.description {
        validate_text(&mut errors, "description", description, MAX_DESCRIPTION_LEN, false);
    }
    if let Some(city) = &request.city {
        validate_text(&mut errors, "city", city, MAX_CITY_LEN, true);
    }
    if let Some(neighborhood) = &request.neighborhood {
        validate_text(&mut errors, "neighborhood", neighborhood, MAX_NEIGHBORHOOD_LEN, false);
    }
    if let Some(address) = &request.address {
        validate_text(&mut errors, "address", address, MAX_ADDRESS_LEN, false);
    }

    validate_numbers(
        &mut errors,
        request.monthly_price.as_ref(),
        request.deposit_amount.as_ref(),
        request.bedrooms,
        request.bathrooms,
        request.area_m2.as_ref(),
    );

    let contract_type = match &request.contract_type {
        Some(raw) => parse_contract_type(&mut errors, raw),
        None => None,
    };
    let status = match &request.status {
        Some(raw) => parse_status(&mut errors, raw),
        None => None,
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NormalizedPatchProperty {
        title: request.title.as_ref().map(|t| t.trim().to_string()),
        description: request.description.as_deref().and_then(optional_text),
        city: request.city.as_ref().map(|c| c.trim().to_string()),
        neighborhood: request.neighborhood.as_deref().and_then(optional_text),
        address: request.address.as_deref().and_then(optional_text),
        monthly_price: request.monthly_price.clone(),
        deposit_amount: request.deposit_amount.clone(),
        bedrooms: request.bedrooms,
        bathrooms: request.bathrooms,
        area_m2: request.area_m2.clone(),
        is_furnished: request.is_furnished,
        available_from: request.available_from,
        contract_type,
        status,
    })
}

fn validate_text(
    errors: &mut ValidationErrors,
    key: &str,
    value: &str,
    max_len: usize,
    required: bool,
) {
    let normalized = value.trim();

    if required && normalized.is_empty() {
        add_error(errors, key, format!("{key} is required."));
        return;
    }

    if normalized.chars().count() > max_len {
        add_error(errors, key, format!("{key} cannot exceed {max_len} characters."));
    }
}

fn validate_numbers(
    errors: &mut ValidationErrors,
    monthly_price: Option<&BigDecimal>,
    deposit_amount: Option<&BigDecimal>,
    bedrooms: Option<i32>,
    bathrooms: Option<i32>,
    area_m2: Option<&BigDecimal>,
) {
    let zero = BigDecimal::from(0);

    if let Some(monthly_price) = monthly_price {
        if *monthly_price <= zero {
            add_error(errors, "monthly_price", "monthly_price must be greater than 0.");
        }
    }
    if let Some(deposit_amount) = deposit_amount {
        if *deposit_amount < zero {
            add_error(errors, "deposit_amount", "deposit_amount cannot be negative.");
        }
    }
    if let Some(bedrooms) = bedrooms {
        if bedrooms < 0 {
            add_error(errors, "bedrooms", "bedrooms cannot be negative.");
        }
    }
    if let Some(bathrooms) = bathrooms {
        if bathrooms < 0 {
            add_error(errors, "bathrooms", "bathrooms cannot be negative.");
        }
    }
    if let Some(area_m2) = area_m2 {
        if *area_m2 <= zero {
            add_error(errors, "area_m2", "area_m2 must be greater than 0.");
        }
    }
}

fn parse_contract_type(errors: &mut ValidationErrors, raw: &str) -> Option<ContractType> {
    match ContractType::parse(raw) {
        Some(parsed) => Some(parsed),
        None => {
            add_error(
                errors,
                "contract_type",
                "contract_type must be one of: long_term, temporary, monthly.",
            );
            None
        }
    }
}

fn parse_status(errors: &mut ValidationErrors, raw: &str) -> Option<PropertyStatus> {
    match PropertyStatus::parse(raw) {
        Some(parsed) => Some(parsed),
        None => {
            add_error(
                errors,
                "status",
                "status must be one of: pendiente, publicado, rechazado.",
            );
            None
        }
    }
}
