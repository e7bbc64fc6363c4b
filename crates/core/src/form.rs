//! Today's single-distribution form: draft values, validation, and the
//! request body sent on queue/modify.

use serde::{Deserialize, Serialize};

use crate::distribution::DistributionValues;
use crate::error::CoreError;

/// Rejected when rosPercentage, premiumPoolAmount and performancePoolAmount
/// are all zero (or not numbers).
pub const AT_LEAST_ONE_VALUE: &str = "At least one value (ROS percentage, premium pool or \
     performance pool) must be greater than zero";

pub const ROS_RANGE: &str = "ROS percentage must be between 0 and 100";

pub const NEGATIVE_PREMIUM_POOL: &str = "Premium pool amount cannot be negative";

pub const NEGATIVE_PERFORMANCE_POOL: &str = "Performance pool amount cannot be negative";

/// Local draft of today's distribution values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValues {
    pub ros_percentage: f64,
    pub premium_pool_amount: f64,
    pub performance_pool_amount: f64,
    #[serde(default)]
    pub description: String,
}

/// Body of `queue` and `modify` requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
    pub ros_percentage: f64,
    pub premium_pool_amount: f64,
    pub performance_pool_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
}

/// Non-numbers count as zero, matching how an empty input is read.
fn number_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

impl FormValues {
    /// Copy of the form with every non-finite number replaced by zero.
    pub fn normalized(&self) -> Self {
        Self {
            ros_percentage: number_or_zero(self.ros_percentage),
            premium_pool_amount: number_or_zero(self.premium_pool_amount),
            performance_pool_amount: number_or_zero(self.performance_pool_amount),
            description: self.description.clone(),
        }
    }

    /// Client-side checks mirrored from the server.
    ///
    /// All three values may be non-zero together; only the all-zero case
    /// is rejected.
    pub fn validate(&self) -> Result<(), CoreError> {
        let v = self.normalized();

        if v.ros_percentage == 0.0
            && v.premium_pool_amount == 0.0
            && v.performance_pool_amount == 0.0
        {
            return Err(CoreError::Validation(AT_LEAST_ONE_VALUE.into()));
        }
        if !(0.0..=100.0).contains(&v.ros_percentage) {
            return Err(CoreError::Validation(ROS_RANGE.into()));
        }
        if v.premium_pool_amount < 0.0 {
            return Err(CoreError::Validation(NEGATIVE_PREMIUM_POOL.into()));
        }
        if v.performance_pool_amount < 0.0 {
            return Err(CoreError::Validation(NEGATIVE_PERFORMANCE_POOL.into()));
        }
        Ok(())
    }

    /// Validate and build the request body.
    pub fn to_request(&self) -> Result<DistributionRequest, CoreError> {
        self.validate()?;
        let v = self.normalized();
        let description = v.description.trim();
        Ok(DistributionRequest {
            ros_percentage: v.ros_percentage,
            premium_pool_amount: v.premium_pool_amount,
            performance_pool_amount: v.performance_pool_amount,
            description: (!description.is_empty()).then(|| description.to_string()),
        })
    }
}

impl From<&DistributionValues> for FormValues {
    fn from(values: &DistributionValues) -> Self {
        Self {
            ros_percentage: values.ros_percentage,
            premium_pool_amount: values.premium_pool_amount,
            performance_pool_amount: values.performance_pool_amount,
            description: values.description.clone().unwrap_or_default(),
        }
    }
}
