//! Flight records as produced by the flight source.
//!
//! All fields are plain text and an empty string means "unknown". The
//! accessors here resolve the fallback chains used when rendering, and are
//! total: a record with every field empty still yields (empty) text.

use serde::{Deserialize, Serialize};

/// One end of a flight.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct Airport {
    /// ICAO airport code (e.g., "KSFO")
    #[schema(example = "KSFO")]
    pub code_icao: String,
}

/// One observed flight.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct FlightInfo {
    /// Flight identifier (e.g., "UA123")
    pub ident: String,
    /// ICAO flight identifier (e.g., "UAL123")
    pub ident_icao: String,
    pub operator_code: String,
    pub operator_iata: String,
    pub operator_icao: String,
    /// Full airline name (e.g., "United Airlines")
    #[schema(example = "United Airlines")]
    pub airline_display_name_full: String,
    /// Short aircraft name (e.g., "Boeing 737-800")
    #[schema(example = "Boeing 737-800")]
    pub aircraft_display_name_short: String,
    /// ICAO aircraft type code (e.g., "B738")
    pub aircraft_code: String,
    pub origin: Airport,
    pub destination: Airport,
}

/// First non-empty candidate, or `""` when all are empty.
fn first_present<'a>(candidates: &[&'a str]) -> &'a str {
    candidates
        .iter()
        .copied()
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

impl FlightInfo {
    /// Airline: full display name, then IATA, ICAO, and raw operator code.
    pub fn airline_name(&self) -> &str {
        first_present(&[
            self.airline_display_name_full.as_str(),
            self.operator_iata.as_str(),
            self.operator_icao.as_str(),
            self.operator_code.as_str(),
        ])
    }

    /// Flight identifier: `ident`, then `ident_icao`.
    pub fn flight_ident(&self) -> &str {
        first_present(&[self.ident.as_str(), self.ident_icao.as_str()])
    }

    /// Aircraft type: short display name, then raw aircraft code.
    pub fn aircraft_type(&self) -> &str {
        first_present(&[self.aircraft_display_name_short.as_str(), self.aircraft_code.as_str()])
    }

    /// Route as `ORIGIN>DESTINATION`. Unknown airports leave their side empty.
    pub fn route(&self) -> String {
        format!("{}>{}", self.origin.code_icao, self.destination.code_icao)
    }

    /// One-line description: airline, ident, aircraft, and `ORIG-DEST`,
    /// skipping whatever is unknown.
    pub fn summary_line(&self) -> String {
        let mut line = self.airline_name().to_string();
        let route = format!("{}-{}", self.origin.code_icao, self.destination.code_icao);

        for part in [self.flight_ident(), self.aircraft_type()] {
            if !part.is_empty() {
                line.push(' ');
                line.push_str(part);
            }
        }
        if route.len() > 1 {
            line.push(' ');
            line.push_str(&route);
        }
        line
    }
}
