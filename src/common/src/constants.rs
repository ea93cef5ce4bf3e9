pub const DEFAULT_OFFERS_BASE_URL: &str = "https://pricing.us-east-1.amazonaws.com";
pub const DEFAULT_SERVICE_CODE: &str = "AmazonEC2";

// The Pricing query API is only served out of a couple of regions.
pub const PRICING_API_REGION: &str = "us-east-1";

pub const STORAGE_PRODUCT_FAMILY: &str = "Storage";
pub const USD: &str = "USD";

pub const GB_MONTH_UNIT: &str = "GB-Mo";
pub const IOPS_MONTH_UNIT: &str = "IOPS-Mo";

pub const PROVISIONED_IOPS: &str = "Provisioned IOPS";

pub const DEFAULT_SAVINGS_TABLE: &str = "VolumesSavingsTracker";
pub const DEFAULT_LISTINGS_TABLE: &str = "VolumePricing";
pub const DEFAULT_SAVINGS_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
