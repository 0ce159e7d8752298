//! Exchange rates and the currency conversion directive
//!
//! Rates come from a public daily snapshot of EUR-based rates. The primary URL
//! is keyed by today's UTC date; when it fails the `latest` snapshot is tried
//! once with the date as a query parameter.

use crate::backend::translator::TranslationRequest;
use crate::error::{TranslateError, TranslateResult};
use crate::options::Currency;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Rates per EUR keyed by lowercase currency code
pub type EurRates = HashMap<String, f64>;

/// Where exchange rates come from
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn eur_rates(&self, date: NaiveDate) -> TranslateResult<EurRates>;
}

#[derive(Debug, Deserialize)]
struct RateTable {
    eur: EurRates,
}

/// Rate source backed by the jsDelivr-hosted currency snapshots
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRateSource {
    const DEFAULT_BASE_URL: &'static str = "https://cdn.jsdelivr.net/gh/fawazahmed0/currency-api@1";

    pub fn new() -> TranslateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| TranslateError::RemoteService(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn dated_url(&self, date: NaiveDate) -> String {
        format!("{}/{}/currencies/eur.json", self.base_url, date.format("%Y-%m-%d"))
    }

    fn latest_url(&self) -> String {
        format!("{}/latest/currencies/eur.json", self.base_url)
    }

    async fn fetch(&self, request: reqwest::RequestBuilder) -> TranslateResult<EurRates> {
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(TranslateError::RemoteService(format!(
                "Exchange rate request failed ({})",
                response.status()
            )));
        }
        let table: RateTable = response.json().await.map_err(|e| {
            TranslateError::RemoteService(format!("Failed to parse exchange rates: {}", e))
        })?;
        Ok(table.eur)
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn eur_rates(&self, date: NaiveDate) -> TranslateResult<EurRates> {
        match self.fetch(self.client.get(self.dated_url(date))).await {
            Ok(rates) => Ok(rates),
            Err(err) => {
                warn!(error = %err, "dated exchange rates unavailable, falling back to latest");
                let day = date.format("%Y-%m-%d").to_string();
                self.fetch(self.client.get(self.latest_url()).query(&[("date", day.as_str())]))
                    .await
            }
        }
    }
}

/// Units of `to` per unit of `from`, derived from EUR-based rates
///
/// The rate is cross-computed as `eur[to] / eur[from]` so a non-EUR source
/// currency converts correctly; it equals `eur[to]` when the source is EUR.
/// A rate of exactly 1 (same currency) makes the directive forbid conversion.
pub fn resolve_rate(rates: &EurRates, from: &str, to: &str) -> TranslateResult<f64> {
    let per_eur = |code: &str| -> TranslateResult<f64> {
        let code = code.to_lowercase();
        if code == "eur" {
            return Ok(1.0);
        }
        rates
            .get(&code)
            .copied()
            .filter(|rate| *rate > 0.0)
            .ok_or_else(|| {
                TranslateError::RemoteService(format!("No exchange rate for {}", code.to_uppercase()))
            })
    };
    Ok(per_eur(to)? / per_eur(from)?)
}

/// What the model may do with currency amounts
#[derive(Debug, Clone, PartialEq)]
pub enum CurrencyDirective {
    /// Leave every number and currency exactly as written
    Forbid,
    /// Rewrite amounts from one currency to another at `rate`
    Convert {
        from: Currency,
        to: Currency,
        rate: f64,
    },
}

impl CurrencyDirective {
    /// Build the directive for one call; rates are only fetched when conversion
    /// was asked for
    pub fn for_request(rate: Option<f64>, from: &Currency, to: &Currency) -> Self {
        match rate {
            Some(rate) if (rate - 1.0).abs() > f64::EPSILON => CurrencyDirective::Convert {
                from: from.clone(),
                to: to.clone(),
                rate,
            },
            _ => CurrencyDirective::Forbid,
        }
    }

    /// Natural-language instruction embedded in the system prompt
    pub fn instruction(&self) -> String {
        match self {
            CurrencyDirective::Forbid => {
                "Do not convert any currency or change any number formatting: every amount \
                 must be reported with its exact source text as `original`."
                    .to_string()
            }
            CurrencyDirective::Convert { from, to, rate } => format!(
                "The user explicitly requires every number with a currency to be converted from {} \
                 with format {} to {} with format {}. The exchange rate {}:{} is {}. Report each \
                 such amount with its numeric `value` in {} as written in the source and its exact \
                 source text as `original`; the conversion, flooring (to a multiple of 50 up to \
                 100, of 100 above 100, of 1000 above 1000) and thousands separators are applied \
                 for you.",
                from.code, from.format, to.code, to.format, from.code, to.code, rate, from.code,
            ),
        }
    }

    /// Text that replaces one reported amount in the translation
    pub fn render(&self, value: f64, original: &str) -> String {
        match self {
            CurrencyDirective::Forbid => original.to_string(),
            CurrencyDirective::Convert { to, rate, .. } => {
                to.render(&group_thousands(floor_by_tier(value * rate)))
            }
        }
    }
}

/// Floor to a multiple of 50 up to 100, of 100 above 100, of 1000 above 1000
///
/// Amounts that would floor to zero (below 50) keep their whole-unit value
/// instead, so a converted price never renders as 0.
pub fn floor_by_tier(value: f64) -> f64 {
    let step = if value > 1000.0 {
        1000.0
    } else if value > 100.0 {
        100.0
    } else {
        50.0
    };
    let floored = (value / step).floor() * step;
    if floored == 0.0 { value.floor() } else { floored }
}

/// `1234567` → `1,234,567`
pub fn group_thousands(value: f64) -> String {
    let whole = format!("{:.0}", value.abs());
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if value < 0.0 && whole != "0" {
        grouped.insert(0, '-');
    }
    grouped
}

/// Computes the currency directive for an OpenAI call
#[derive(Clone)]
pub struct CurrencyConverter {
    rates: Arc<dyn RateSource>,
}

impl CurrencyConverter {
    pub fn new(rates: Arc<dyn RateSource>) -> Self {
        Self { rates }
    }

    pub async fn directive(&self, request: &TranslationRequest) -> TranslateResult<CurrencyDirective> {
        if !request.convert_currency {
            return Ok(CurrencyDirective::Forbid);
        }

        let options = &request.options;
        let currency = |locale: &str| {
            options.currency_for(locale).ok_or_else(|| {
                TranslateError::Configuration(format!("No currency configured for locale {}", locale))
            })
        };
        let from = currency(&options.from_locale)?;
        let to = currency(&options.to_locale)?;

        let rate = if from.code.eq_ignore_ascii_case(&to.code) {
            1.0
        } else {
            let rates = self.rates.eur_rates(Utc::now().date_naive()).await?;
            resolve_rate(&rates, &from.code, &to.code)?
        };
        debug!(from = %from.code, to = %to.code, rate, "resolved exchange rate");

        Ok(CurrencyDirective::for_request(Some(rate), from, to))
    }
}

impl std::fmt::Debug for CurrencyConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrencyConverter").finish_non_exhaustive()
    }
}
