//! Per-record variable values for template rendering

use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use std::collections::HashMap;

use crate::canonical::CanonicalMatch;
use crate::record::Team;
use crate::template::Variable;

/// Every template variable's value for one record.
///
/// Built fresh for each render from a [`CanonicalMatch`]: "team 1" is the
/// team in canonical slot 0 and "team 2" is every other team joined with `v`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateContext {
	values: HashMap<Variable, String>,
}

fn pad2(n: impl Into<i64>) -> String {
	format!("{:02}", n.into())
}

impl TemplateContext {
	/// Derive values with timestamps in the machine's local time zone
	pub fn derive(canon: &CanonicalMatch<'_>) -> Self {
		Self::derive_in(canon, &Local)
	}

	pub fn derive_in<Tz: TimeZone>(canon: &CanonicalMatch<'_>, tz: &Tz) -> Self {
		let record = canon.record();
		let first = canon.first();
		let rest: Vec<&Team> = canon.rest().collect();

		let ladder_rating = |team: &Team| {
			if record.is_ladder {
				team.lead_rating().max(0)
			} else {
				0
			}
		};
		let join_rest = |f: &dyn Fn(&Team) -> String| {
			rest.iter().map(|t| f(*t)).collect::<Vec<_>>().join("v")
		};

		let team1 = first.map(Team::roster).unwrap_or_default();
		let t1mmr = first.map(ladder_rating).unwrap_or(0).to_string();
		let wl = if canon.first_won() { "W" } else { "L" };

		let started = DateTime::<Utc>::from_timestamp(record.unix_timestamp, 0)
			.unwrap_or_default()
			.with_timezone(tz);
		let (day, month, year) = (
			pad2(started.day()),
			pad2(started.month()),
			pad2(started.year()),
		);
		let (hour, min, sec) = (
			pad2(started.hour()),
			pad2(started.minute()),
			pad2(started.second()),
		);
		let unique_id = format!("{day}{month}{year}{hour}{min}{sec}");

		let duration = record.duration_seconds;
		let current_name = record
			.source_path
			.file_stem()
			.map(|s| s.to_string_lossy().into_owned())
			.unwrap_or_default();

		let mut values = HashMap::with_capacity(Variable::ALL.len());
		values.insert(Variable::T1WithMmr, format!("{team1}({t1mmr})"));
		values.insert(Variable::Team1, team1);
		values.insert(
			Variable::T1Races,
			first.map(|t| t.lineup.clone()).unwrap_or_default(),
		);
		values.insert(Variable::T1Mmr, t1mmr);
		values.insert(Variable::WlUpper, wl.to_string());
		values.insert(Variable::Wl, wl.to_lowercase());
		values.insert(Variable::Team2, join_rest(&|t: &Team| t.roster()));
		values.insert(
			Variable::T2WithMmr,
			join_rest(&|t: &Team| format!("{}({})", t.roster(), ladder_rating(t))),
		);
		values.insert(Variable::T2Races, join_rest(&|t: &Team| t.lineup.clone()));
		values.insert(
			Variable::T2Mmr,
			join_rest(&|t: &Team| {
				if record.has_computer_players {
					"0".to_string()
				} else {
					t.lead_rating().to_string()
				}
			}),
		);
		values.insert(Variable::Map, record.map_name.clone());
		values.insert(Variable::DurationHours, (duration / 3600).to_string());
		values.insert(Variable::DurationMins, (duration / 60 % 60).to_string());
		values.insert(Variable::DurationSecs, (duration % 60).to_string());
		values.insert(Variable::Day, day);
		values.insert(Variable::Month, month);
		values.insert(Variable::Year, year);
		values.insert(Variable::Hour, hour);
		values.insert(Variable::Min, min);
		values.insert(Variable::Sec, sec);
		values.insert(Variable::GameType, record.game_type.clone());
		values.insert(Variable::Expansion, record.expansion.to_string());
		values.insert(Variable::CurrentName, current_name);
		values.insert(Variable::UniqueId, unique_id);

		Self { values }
	}

	pub fn get(&self, var: Variable) -> &str {
		self.values.get(&var).map(String::as_str).unwrap_or("")
	}
}
