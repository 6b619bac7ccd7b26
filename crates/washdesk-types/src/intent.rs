use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Coarse category assigned to an inbound customer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CoinProblem,
    WashProblem,
    DryProblem,
    MachineProblem,
    HumanEscalation,
    HoursLocation,
    Pricing,
    GeneralInquiry,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CoinProblem => "coin_problem",
            Intent::WashProblem => "wash_problem",
            Intent::DryProblem => "dry_problem",
            Intent::MachineProblem => "machine_problem",
            Intent::HumanEscalation => "human_escalation",
            Intent::HoursLocation => "hours_location",
            Intent::Pricing => "pricing",
            Intent::GeneralInquiry => "general_inquiry",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the stored labels as well as the Spanish labels a configured
/// Gupshup bot answers with.
impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "coin_problem" | "problema_monedas" => Ok(Intent::CoinProblem),
            "wash_problem" | "problema_lavado" => Ok(Intent::WashProblem),
            "dry_problem" | "problema_secado" => Ok(Intent::DryProblem),
            "machine_problem" | "problema_maquina" => Ok(Intent::MachineProblem),
            "human_escalation" | "escalamiento_humano" => Ok(Intent::HumanEscalation),
            "hours_location" | "horarios_ubicacion" => Ok(Intent::HoursLocation),
            "pricing" | "consulta_precios" => Ok(Intent::Pricing),
            "general_inquiry" | "consulta_general" => Ok(Intent::GeneralInquiry),
            other => Err(format!("unknown intent: {}", other)),
        }
    }
}
