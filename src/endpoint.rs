//! Upstream endpoint catalogue: paths, fixed headers, and per-endpoint hash field naming.

// self
use crate::_prelude::*;

/// Production base URL of the upstream API.
pub const DEFAULT_BASE_URL: &str = "https://developer.ecobank.com";
/// `Origin` header value required by every upstream endpoint.
pub const ORIGIN: &str = "developer.ecobank.com";
/// Path of the token issuance endpoint.
pub const TOKEN_PATH: &str = "/corporateapi/user/token";

/// Parses [`DEFAULT_BASE_URL`].
pub fn default_base_url() -> Url {
	// The constant is a valid absolute URL, so parsing cannot fail.
	Url::parse(DEFAULT_BASE_URL).expect("DEFAULT_BASE_URL must parse")
}

/// Field name convention used for the integrity hash; varies per endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HashField {
	/// `secureHash`.
	Camel,
	/// `secure_hash`.
	Snake,
}
impl HashField {
	/// Returns the literal field name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Camel => "secureHash",
			Self::Snake => "secure_hash",
		}
	}
}
impl Display for HashField {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Business endpoints exposed by the upstream API.
///
/// Each endpoint defines its own body schema; this catalogue only records the path and which
/// hash field name, if any, the endpoint expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
	/// Merchant secure-hash check.
	SecureHashCheck,
	/// Express account creation.
	CreateExpressAccount,
	/// Merchant category code lookup.
	MerchantCategoryCode,
	/// Merchant QR code creation.
	CreateMerchantQr,
	/// Dynamic-QR payment.
	DynamicQrPayment,
	/// Batched payment submission.
	Payment,
	/// Transaction enquiry.
	TransactionEnquiry,
	/// Account balance lookup.
	AccountBalance,
	/// Account enquiry.
	AccountEnquiry,
}
impl Endpoint {
	/// Returns the endpoint's request path.
	pub const fn path(self) -> &'static str {
		match self {
			Self::SecureHashCheck => "/corporateapi/merchant/securehash",
			Self::CreateExpressAccount => "/corporateapi/merchant/createexpressaccount",
			Self::MerchantCategoryCode => "/corporateapi/merchant/getmcc",
			Self::CreateMerchantQr => "/corporateapi/merchant/createqr",
			Self::DynamicQrPayment => "/corporateapi/merchant/qr",
			Self::Payment => "/corporateapi/merchant/payment",
			Self::TransactionEnquiry => "/corporateapi/merchant/ecobankafrica/transaction/enquiry",
			Self::AccountBalance => "/corporateapi/merchant/accountbalance",
			Self::AccountEnquiry => "/corporateapi/merchant/accountinquiry",
		}
	}

	/// Returns the hash field convention the endpoint expects, when it requires one.
	pub const fn hash_field(self) -> Option<HashField> {
		match self {
			Self::MerchantCategoryCode => None,
			Self::CreateMerchantQr | Self::DynamicQrPayment => Some(HashField::Snake),
			Self::SecureHashCheck
			| Self::CreateExpressAccount
			| Self::Payment
			| Self::TransactionEnquiry
			| Self::AccountBalance
			| Self::AccountEnquiry => Some(HashField::Camel),
		}
	}
}
impl Display for Endpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.path())
	}
}

/// Fixed headers attached to every outbound request.
pub(crate) fn base_headers() -> Vec<(&'static str, String)> {
	vec![
		("Content-Type", "application/json".into()),
		("Accept", "application/json".into()),
		("Origin", ORIGIN.into()),
	]
}

/// Joins a request path onto the configured base URL.
pub(crate) fn join_path(base_url: &Url, path: &str) -> Result<Url> {
	base_url.join(path).map_err(|source| Error::InvalidPath { path: path.into(), source })
}
