//! Employment Metric Module
//! Names the employment columns the analysis compares.

use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// One employment series in the employment table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, ValueEnum)]
pub enum EmploymentMetric {
    /// All workers
    #[value(name = "emp_combined")]
    #[serde(rename = "emp_combined")]
    Combined,
    /// Low income workers (under $27,000)
    #[value(name = "emp_combined_inclow")]
    #[serde(rename = "emp_combined_inclow")]
    IncomeLow,
    /// Middle income workers ($27k to $60k)
    #[value(name = "emp_combined_incmiddle")]
    #[serde(rename = "emp_combined_incmiddle")]
    IncomeMiddle,
    /// High income workers (over $60,000)
    #[value(name = "emp_combined_inchigh")]
    #[serde(rename = "emp_combined_inchigh")]
    IncomeHigh,
    /// Trade, transportation and utilities
    #[value(name = "emp_combined_ss40")]
    #[serde(rename = "emp_combined_ss40")]
    TradeTransportUtilities,
    /// Professional and business services
    #[value(name = "emp_combined_ss60")]
    #[serde(rename = "emp_combined_ss60")]
    ProfessionalBusiness,
    /// Education and health services
    #[value(name = "emp_combined_ss65")]
    #[serde(rename = "emp_combined_ss65")]
    EducationHealth,
    /// Leisure and hospitality
    #[value(name = "emp_combined_ss70")]
    #[serde(rename = "emp_combined_ss70")]
    LeisureHospitality,
}

impl EmploymentMetric {
    pub const ALL: [EmploymentMetric; 8] = [
        EmploymentMetric::Combined,
        EmploymentMetric::IncomeLow,
        EmploymentMetric::IncomeMiddle,
        EmploymentMetric::IncomeHigh,
        EmploymentMetric::TradeTransportUtilities,
        EmploymentMetric::ProfessionalBusiness,
        EmploymentMetric::EducationHealth,
        EmploymentMetric::LeisureHospitality,
    ];

    /// Column name in the employment table.
    pub fn column(self) -> &'static str {
        match self {
            EmploymentMetric::Combined => "emp_combined",
            EmploymentMetric::IncomeLow => "emp_combined_inclow",
            EmploymentMetric::IncomeMiddle => "emp_combined_incmiddle",
            EmploymentMetric::IncomeHigh => "emp_combined_inchigh",
            EmploymentMetric::TradeTransportUtilities => "emp_combined_ss40",
            EmploymentMetric::ProfessionalBusiness => "emp_combined_ss60",
            EmploymentMetric::EducationHealth => "emp_combined_ss65",
            EmploymentMetric::LeisureHospitality => "emp_combined_ss70",
        }
    }

    /// Axis label used by the chart renderer.
    pub fn axis_label(self) -> &'static str {
        match self {
            EmploymentMetric::Combined => "Employment level for all workers",
            EmploymentMetric::IncomeLow => {
                "Employment level for Low Income Workers (under $27,000)"
            }
            EmploymentMetric::IncomeMiddle => {
                "Employment level for Mid Income Workers ($27k to $60k)"
            }
            EmploymentMetric::IncomeHigh => {
                "Employment level for Top Income Workers (over $60,000)"
            }
            EmploymentMetric::TradeTransportUtilities => {
                "Employment level for Workers in trade, transportation and utilities"
            }
            EmploymentMetric::ProfessionalBusiness => {
                "Employment level for Workers in professional and business services"
            }
            EmploymentMetric::EducationHealth => {
                "Employment level for Workers in education and health services"
            }
            EmploymentMetric::LeisureHospitality => {
                "Employment level for Workers in leisure and hospitality"
            }
        }
    }
}

impl fmt::Display for EmploymentMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}
