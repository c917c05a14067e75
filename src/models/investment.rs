//! Investment calculator input/output shapes (§4.9 / §6), ported field for
//! field from `original_source/api/v1/investment_calculator.py`'s
//! `InvestmentParams` / `InterestPriceResult`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::enums::ProjectType;

#[derive(Debug, Clone, Deserialize)]
pub struct InvestmentParams {
    #[serde(default = "default_bargain_discount")]
    pub bargain_discount: f64,

    #[serde(default = "default_monthly_rate")]
    pub monthly_rate: f64,
    #[serde(default = "default_project_months")]
    pub project_period_months: f64,

    #[serde(default = "default_partner_split")]
    pub partner_split: f64,
    #[serde(default = "default_min_profit")]
    pub min_profit: f64,

    #[serde(default = "default_mortgage_rate")]
    pub mortgage_rate: f64,
    #[serde(default = "default_mortgage_issue_fee")]
    pub mortgage_issue_fee: f64,
    #[serde(default = "default_mortgage_prepay_months")]
    pub mortgage_prepay_months: f64,
    #[serde(default = "default_ltv")]
    pub ltv: f64,

    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,

    #[serde(default)]
    pub include_notary: bool,
    #[serde(default = "default_notary_fee")]
    pub notary_fee: f64,

    #[serde(default)]
    pub include_state_fee: bool,
    #[serde(default = "default_state_fee")]
    pub state_fee: f64,

    #[serde(default)]
    pub include_pip: bool,
    #[serde(default = "default_pip_per_sqm")]
    pub pip_per_sqm: f64,

    #[serde(default)]
    pub include_agency: bool,
    #[serde(default = "default_agency_fee")]
    pub agency_fee: f64,

    #[serde(default)]
    pub include_utilities: bool,
    #[serde(default = "default_utilities_per_month")]
    pub utilities_per_month: f64,

    #[serde(default)]
    pub include_eviction: bool,
    #[serde(default = "default_eviction_cost")]
    pub eviction_cost: f64,

    #[serde(default)]
    pub include_renovation: bool,
    #[serde(default = "default_renovation_per_sqm")]
    pub renovation_per_sqm: f64,
    #[serde(default = "default_renovation_multiplier")]
    pub renovation_multiplier: f64,

    #[serde(default)]
    pub include_foreman: bool,
    #[serde(default = "default_foreman_fee")]
    pub foreman_fee: f64,

    #[serde(default)]
    pub include_financing: bool,
    #[serde(default = "default_financing_rate")]
    pub financing_rate: f64,

    #[serde(default)]
    pub include_registrators_transfer: bool,
    #[serde(default = "default_registrators_transfer_fee")]
    pub registrators_transfer_fee: f64,

    #[serde(default)]
    pub include_registrators_mortgage: bool,
    #[serde(default = "default_registrators_mortgage_fee")]
    pub registrators_mortgage_fee: f64,

    #[serde(default)]
    pub include_contur_registration: bool,
    #[serde(default = "default_contur_registration_fee")]
    pub contur_registration_fee: f64,
}

impl Default for InvestmentParams {
    fn default() -> Self {
        InvestmentParams {
            bargain_discount: default_bargain_discount(),
            monthly_rate: default_monthly_rate(),
            project_period_months: default_project_months(),
            partner_split: default_partner_split(),
            min_profit: default_min_profit(),
            mortgage_rate: default_mortgage_rate(),
            mortgage_issue_fee: default_mortgage_issue_fee(),
            mortgage_prepay_months: default_mortgage_prepay_months(),
            ltv: default_ltv(),
            tax_rate: default_tax_rate(),
            include_notary: false,
            notary_fee: default_notary_fee(),
            include_state_fee: false,
            state_fee: default_state_fee(),
            include_pip: false,
            pip_per_sqm: default_pip_per_sqm(),
            include_agency: false,
            agency_fee: default_agency_fee(),
            include_utilities: false,
            utilities_per_month: default_utilities_per_month(),
            include_eviction: false,
            eviction_cost: default_eviction_cost(),
            include_renovation: false,
            renovation_per_sqm: default_renovation_per_sqm(),
            renovation_multiplier: default_renovation_multiplier(),
            include_foreman: false,
            foreman_fee: default_foreman_fee(),
            include_financing: false,
            financing_rate: default_financing_rate(),
            include_registrators_transfer: false,
            registrators_transfer_fee: default_registrators_transfer_fee(),
            include_registrators_mortgage: false,
            registrators_mortgage_fee: default_registrators_mortgage_fee(),
            include_contur_registration: false,
            contur_registration_fee: default_contur_registration_fee(),
        }
    }
}

fn default_bargain_discount() -> f64 {
    0.07
}
fn default_monthly_rate() -> f64 {
    0.04
}
fn default_project_months() -> f64 {
    3.0
}
fn default_partner_split() -> f64 {
    0.5
}
fn default_min_profit() -> f64 {
    1_000_000.0
}
fn default_mortgage_rate() -> f64 {
    0.02
}
fn default_mortgage_issue_fee() -> f64 {
    0.0075
}
fn default_mortgage_prepay_months() -> f64 {
    3.0
}
fn default_ltv() -> f64 {
    0.8
}
fn default_tax_rate() -> f64 {
    0.06
}
fn default_notary_fee() -> f64 {
    50_000.0
}
fn default_state_fee() -> f64 {
    4_000.0
}
fn default_pip_per_sqm() -> f64 {
    1_500.0
}
fn default_agency_fee() -> f64 {
    200_000.0
}
fn default_utilities_per_month() -> f64 {
    11_500.0
}
fn default_eviction_cost() -> f64 {
    150_000.0
}
fn default_renovation_per_sqm() -> f64 {
    50_000.0
}
fn default_renovation_multiplier() -> f64 {
    1.8
}
fn default_foreman_fee() -> f64 {
    100_000.0
}
fn default_financing_rate() -> f64 {
    0.30
}
fn default_registrators_transfer_fee() -> f64 {
    15_000.0
}
fn default_registrators_mortgage_fee() -> f64 {
    10_000.0
}
fn default_contur_registration_fee() -> f64 {
    4_000.0
}

#[derive(Debug, Clone, Serialize)]
pub struct MortgageBreakdown {
    pub mortgage_amount: f64,
    pub mortgage_monthly: f64,
    pub mortgage_total_interest: f64,
    pub mortgage_prepayment: f64,
    pub mortgage_issue: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterestPriceResult {
    pub project_type: ProjectType,

    pub market_price: f64,
    pub market_price_per_sqm: f64,
    pub area_total: f64,

    pub interest_price: f64,
    pub interest_price_per_sqm: f64,

    pub base_sale_price: f64,
    pub final_sale_price: f64,
    pub renovation_bonus: Option<f64>,
    pub renovation_cost: Option<f64>,
    pub renovation_profit: Option<f64>,

    pub total_costs: f64,
    pub fixed_costs: f64,
    pub tax_amount: f64,

    pub expected_profit: f64,
    pub our_profit: f64,
    pub partner_profit: Option<f64>,

    pub profit_rate: f64,
    pub monthly_profit_rate: f64,
    pub our_monthly_rate: f64,

    pub mortgage: Option<MortgageBreakdown>,

    pub project_months: f64,
    pub cost_breakdown: BTreeMap<String, f64>,
}
