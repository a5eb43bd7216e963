//! ECB euro foreign exchange reference rate client
//!
//! Fetches the daily reference rates published by the European Central
//! Bank and derives the USD->EUR rate used by the landed cost calculator.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Source label stored alongside ingested rates
pub const ECB_SOURCE_NAME: &str = "ECB Euro FX Reference Rates";

/// ECB reference rate client
#[derive(Clone)]
pub struct EcbFxClient {
    client: Client,
    url: String,
}

/// One USD->EUR reference rate
#[derive(Debug, Clone, PartialEq)]
pub struct EcbRate {
    /// Euros per US dollar
    pub usd_to_eur: Decimal,
    pub observed_at: DateTime<Utc>,
    pub source_url: String,
}

impl EcbFxClient {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    /// Fetch today's USD->EUR reference rate
    pub async fn fetch_usd_to_eur(&self) -> AppResult<EcbRate> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("ECB request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalService(format!(
                "ECB returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::ExternalService(format!("ECB response unreadable: {}", e)))?;

        let (date, usd_per_eur) = parse_daily_usd_rate(&body)
            .ok_or_else(|| AppError::ExternalService("ECB feed has no USD rate".to_string()))?;

        let usd_to_eur = Decimal::ONE
            .checked_div(usd_per_eur)
            .ok_or_else(|| AppError::ExternalService("ECB USD rate is zero".to_string()))?
            .round_dp(6);

        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| AppError::ExternalService("ECB reference date invalid".to_string()))?;

        Ok(EcbRate {
            usd_to_eur,
            observed_at: Utc.from_utc_datetime(&midnight),
            source_url: self.url.clone(),
        })
    }
}

/// Attribute text of every `<Cube ...>` start tag, in document order
fn cube_tags(xml: &str) -> impl Iterator<Item = &str> {
    xml.split('<').filter_map(|chunk| {
        let tag = chunk.split('>').next()?;
        let attrs = tag.strip_prefix("Cube")?;
        let is_cube = attrs.is_empty() || attrs.starts_with(char::is_whitespace) || attrs.starts_with('/');
        is_cube.then_some(attrs)
    })
}

/// Value of the attribute named exactly `name` in a start tag's attribute text
fn attribute<'a>(attrs: &'a str, name: &str) -> Option<&'a str> {
    let mut rest = attrs;
    loop {
        rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '/');
        let eq = rest.find('=')?;
        let key = rest[..eq].trim();
        let value_part = rest[eq + 1..].trim_start();
        let quote = value_part.chars().next()?;
        if quote != '\'' && quote != '"' {
            return None;
        }
        let end = value_part[1..].find(quote)? + 1;
        if key == name {
            return Some(&value_part[1..end]);
        }
        rest = &value_part[end + 1..];
    }
}

/// Parse the reference date and the USD-per-EUR rate from the daily feed
pub fn parse_daily_usd_rate(xml: &str) -> Option<(NaiveDate, Decimal)> {
    let date = cube_tags(xml)
        .find_map(|attrs| attribute(attrs, "time"))
        .and_then(|time| NaiveDate::parse_from_str(time, "%Y-%m-%d").ok())?;

    let rate = cube_tags(xml)
        .find(|attrs| attribute(attrs, "currency") == Some("USD"))
        .and_then(|attrs| attribute(attrs, "rate"))
        .and_then(|rate| Decimal::from_str(rate).ok())?;
    if rate <= Decimal::ZERO {
        return None;
    }

    Some((date, rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gesmes:Envelope xmlns:gesmes="http://www.gesmes.org/xml/2002-08-01" xmlns="http://www.ecb.int/vocabulary/2002-08-01/eurofxref">
    <gesmes:subject>Reference rates</gesmes:subject>
    <Cube>
        <Cube time='2026-10-16'>
            <Cube currency='USD' rate='1.0850'/>
            <Cube currency='JPY' rate='161.20'/>
        </Cube>
    </Cube>
</gesmes:Envelope>"#;

    #[test]
    fn test_parse_daily_feed() {
        let (date, rate) = parse_daily_usd_rate(FEED).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(rate, Decimal::from_str("1.0850").unwrap());
    }

    #[test]
    fn test_feed_without_usd() {
        let feed = FEED.replace("currency='USD'", "currency='CHF'");
        assert!(parse_daily_usd_rate(&feed).is_none());
    }

    #[test]
    fn test_double_quoted_attributes() {
        let feed = r#"<Cube time="2026-10-16"><Cube currency="USD" rate="1.25"/></Cube>"#;
        let (_, rate) = parse_daily_usd_rate(feed).unwrap();
        assert_eq!(rate, Decimal::from_str("1.25").unwrap());
    }

    #[test]
    fn test_only_exact_cube_attributes_match() {
        let feed = r#"<Envelope><Sender update_time='1999-01-01'/>
            <Cube><Cube datetime='2000-01-01' time='2026-10-16'>
                <Cube currency='USD' fxrate='9.99' rate='1.0850'/>
            </Cube></Cube></Envelope>"#;
        let (date, rate) = parse_daily_usd_rate(feed).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(rate, Decimal::from_str("1.0850").unwrap());
    }
}
