//! Filename templates: parsing, alias resolution and rendering
//!
//! A template is free text with `$name` placeholders. Parsing splits it once
//! into literal and variable segments; at each `$` the longest known name wins,
//! so `$myteamwithmmr` is never read as `$myteam` followed by `withmmr`.
//! Anything after a `$` that is not a known name is kept verbatim.
//!
//! The `$my*`/`$opp*` aliases are resolved to their `team1`/`team2` forms
//! during parsing. A template that uses any of them needs the operator's
//! player id, and rendering then puts the operator's team first.

use std::fmt;

use crate::canonical::CanonicalMatch;
use crate::context::TemplateContext;
use crate::record::{MatchRecord, StableId};

/// Variables a template can reference, after alias resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
	Team1,
	T1Races,
	T1Mmr,
	T1WithMmr,
	Wl,
	WlUpper,
	Team2,
	T2WithMmr,
	T2Races,
	T2Mmr,
	Map,
	DurationHours,
	DurationMins,
	DurationSecs,
	Month,
	Year,
	Day,
	Hour,
	Min,
	Sec,
	GameType,
	Expansion,
	CurrentName,
	UniqueId,
}

impl Variable {
	pub const ALL: [Variable; 24] = [
		Variable::Team1,
		Variable::T1Races,
		Variable::T1Mmr,
		Variable::T1WithMmr,
		Variable::Wl,
		Variable::WlUpper,
		Variable::Team2,
		Variable::T2WithMmr,
		Variable::T2Races,
		Variable::T2Mmr,
		Variable::Map,
		Variable::DurationHours,
		Variable::DurationMins,
		Variable::DurationSecs,
		Variable::Month,
		Variable::Year,
		Variable::Day,
		Variable::Hour,
		Variable::Min,
		Variable::Sec,
		Variable::GameType,
		Variable::Expansion,
		Variable::CurrentName,
		Variable::UniqueId,
	];

	/// Placeholder name without the leading `$`
	pub fn name(self) -> &'static str {
		match self {
			Variable::Team1 => "team1",
			Variable::T1Races => "t1races",
			Variable::T1Mmr => "t1mmr",
			Variable::T1WithMmr => "t1withmmr",
			Variable::Wl => "wl",
			Variable::WlUpper => "WL",
			Variable::Team2 => "team2",
			Variable::T2WithMmr => "t2withmmr",
			Variable::T2Races => "t2races",
			Variable::T2Mmr => "t2mmr",
			Variable::Map => "map",
			Variable::DurationHours => "durationhours",
			Variable::DurationMins => "durationmins",
			Variable::DurationSecs => "durationsecs",
			Variable::Month => "month",
			Variable::Year => "year",
			Variable::Day => "day",
			Variable::Hour => "hour",
			Variable::Min => "min",
			Variable::Sec => "sec",
			Variable::GameType => "gametype",
			Variable::Expansion => "expansion",
			Variable::CurrentName => "currentname",
			Variable::UniqueId => "uniqueID",
		}
	}
}

/// Operator-relative names that forward to a canonical variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alias {
	MyTeam,
	OppTeams,
	MyRaces,
	OppRaces,
	MyMmr,
	OppMmr,
	MyTeamWithMmr,
	OppWithMmr,
}

impl Alias {
	pub const ALL: [Alias; 8] = [
		Alias::MyTeam,
		Alias::OppTeams,
		Alias::MyRaces,
		Alias::OppRaces,
		Alias::MyMmr,
		Alias::OppMmr,
		Alias::MyTeamWithMmr,
		Alias::OppWithMmr,
	];

	pub fn name(self) -> &'static str {
		match self {
			Alias::MyTeam => "myteam",
			Alias::OppTeams => "oppteams",
			Alias::MyRaces => "myraces",
			Alias::OppRaces => "oppraces",
			Alias::MyMmr => "mymmr",
			Alias::OppMmr => "oppmmr",
			Alias::MyTeamWithMmr => "myteamwithmmr",
			Alias::OppWithMmr => "oppwithmmr",
		}
	}

	pub fn canonical(self) -> Variable {
		match self {
			Alias::MyTeam => Variable::Team1,
			Alias::OppTeams => Variable::Team2,
			Alias::MyRaces => Variable::T1Races,
			Alias::OppRaces => Variable::T2Races,
			Alias::MyMmr => Variable::T1Mmr,
			Alias::OppMmr => Variable::T2Mmr,
			Alias::MyTeamWithMmr => Variable::T1WithMmr,
			Alias::OppWithMmr => Variable::T2WithMmr,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Var(Variable),
}

/// Longest placeholder name at the start of `rest`, with whether it was an alias
fn match_name(rest: &str) -> Option<(Variable, usize, bool)> {
	let canonical = Variable::ALL
		.iter()
		.map(|v| (*v, v.name(), false));
	let aliases = Alias::ALL
		.iter()
		.map(|a| (a.canonical(), a.name(), true));
	canonical
		.chain(aliases)
		.filter(|(_, name, _)| rest.starts_with(name))
		.max_by_key(|(_, name, _)| name.len())
		.map(|(var, name, alias)| (var, name.len(), alias))
}

/// A parsed filename template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
	source: String,
	segments: Vec<Segment>,
	requires_identity: bool,
}

impl Template {
	pub fn parse(raw: &str) -> Self {
		let mut segments = Vec::new();
		let mut literal = String::new();
		let mut requires_identity = false;
		let mut rest = raw;

		while let Some(pos) = rest.find('$') {
			literal.push_str(&rest[..pos]);
			let after = &rest[pos + 1..];
			match match_name(after) {
				Some((var, len, alias)) => {
					if !literal.is_empty() {
						segments.push(Segment::Literal(std::mem::take(&mut literal)));
					}
					segments.push(Segment::Var(var));
					requires_identity |= alias;
					rest = &after[len..];
				}
				None => {
					literal.push('$');
					rest = after;
				}
			}
		}
		literal.push_str(rest);
		if !literal.is_empty() {
			segments.push(Segment::Literal(literal));
		}

		Self {
			source: raw.to_string(),
			segments,
			requires_identity,
		}
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	/// Whether the template uses `$my*`/`$opp*` names and so needs a player id
	pub fn requires_identity(&self) -> bool {
		self.requires_identity
	}

	/// Operator id to frame teams with: only kept when the template needs it
	pub fn framing(&self, operator: Option<StableId>) -> Option<StableId> {
		operator.filter(|_| self.requires_identity)
	}

	/// Referenced variables in order of appearance, aliases already resolved
	pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
		self.segments.iter().filter_map(|s| match s {
			Segment::Var(v) => Some(*v),
			Segment::Literal(_) => None,
		})
	}

	pub fn uses(&self, var: Variable) -> bool {
		self.variables().any(|v| v == var)
	}

	/// Substitute every placeholder from `ctx`
	pub fn render(&self, ctx: &TemplateContext) -> String {
		let mut out = String::with_capacity(self.source.len() * 2);
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => out.push_str(text),
				Segment::Var(var) => out.push_str(&sanitize(ctx.get(*var))),
			}
		}
		out
	}

	/// Destination file name for `record`, replay extension included.
	///
	/// Teams are put in operator-first order when the template needs it, and
	/// timestamps are rendered in local time.
	pub fn file_name(&self, record: &MatchRecord, operator: Option<StableId>) -> String {
		let canon = CanonicalMatch::new(record, self.framing(operator));
		let ctx = TemplateContext::derive(&canon);
		self.with_extension(self.render(&ctx), record)
	}

	pub(crate) fn with_extension(&self, mut name: String, record: &MatchRecord) -> String {
		if let Some(ext) = record.source_path.extension().and_then(|e| e.to_str()) {
			name.push('.');
			name.push_str(ext);
		}
		name
	}
}

impl fmt::Display for Template {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.source)
	}
}

/// Make a substituted value safe to use inside a single file name
fn sanitize(value: &str) -> String {
	value
		.replace(['/', '\\'], "_")
		.replace('<', "[")
		.replace('>', "]")
		.replace(':', " - ")
		.replace('|', "-")
		.replace(['"', '?', '*'], "")
		.trim_start_matches('.')
		.to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::fixtures::*;
	use chrono::Utc;

	fn render_utc(template: &str, record: &MatchRecord, operator: Option<StableId>) -> String {
		let template = Template::parse(template);
		let canon = CanonicalMatch::new(record, template.framing(operator));
		template.render(&TemplateContext::derive_in(&canon, &Utc))
	}

	#[test_log::test]
	fn test_parse_segments_and_unknown_tokens() {
		let t = Template::parse("$team1 vs $team2 $$foo $");
		assert_eq!(
			t.variables().collect::<Vec<_>>(),
			[Variable::Team1, Variable::Team2]
		);
		assert!(!t.requires_identity());
		assert_eq!(render_utc("$team1 vs $team2 $$foo $", &zvt(), None), "Serral vs Maru $$foo $");
	}

	#[test_log::test]
	fn test_longest_name_wins() {
		let t = Template::parse("$myteamwithmmr|$myteam");
		assert_eq!(
			t.variables().collect::<Vec<_>>(),
			[Variable::T1WithMmr, Variable::Team1]
		);
		assert!(t.requires_identity());
	}

	#[test_log::test]
	fn test_case_sensitive_names() {
		assert_eq!(render_utc("$wl-$WL", &zvt(), None), "w-W");
		assert_eq!(render_utc("$UNIQUEID", &zvt(), None), "$UNIQUEID");
	}

	#[test_log::test]
	fn test_aliases_render_from_operator_side() {
		let rec = zvt();
		assert_eq!(
			render_utc("$myteam ($myraces) vs $oppteams ($oppraces) $wl", &rec, Some(2)),
			"Maru (T) vs Serral (Z) l"
		);
		assert_eq!(
			render_utc("$mymmr v $oppmmr / $myteamwithmmr v $oppwithmmr", &rec, Some(2)),
			"6500 v 6800 / Maru(6500) v Serral(6800)"
		);
	}

	#[test_log::test]
	fn test_operator_ignored_without_aliases() {
		// Plain team1/team2 keep parse order even when an id is known
		assert_eq!(render_utc("$team1", &zvt(), Some(2)), "Serral");
	}

	#[test_log::test]
	fn test_alias_names_do_not_double_substitute() {
		let mut rec = zvt();
		rec.teams[0].players[0].name = "$oppteams".to_string();
		assert_eq!(render_utc("$myteam", &rec, Some(1)), "$oppteams");
	}

	#[test_log::test]
	fn test_values_are_sanitized_but_literals_are_not() {
		let mut rec = zvt();
		rec.map_name = "Lost/Temple: <Remake>?".to_string();
		assert_eq!(render_utc("maps/$map", &rec, None), "maps/Lost_Temple -  [Remake]");
	}

	#[test_log::test]
	fn test_values_never_start_a_hidden_file() {
		let mut rec = zvt();
		rec.map_name = "..hidden".to_string();
		assert_eq!(render_utc("$map", &rec, None), "hidden");
		assert_eq!(render_utc(".$map", &rec, None), ".hidden");
		rec.teams[0].players[0].name = ".Serral".to_string();
		assert_eq!(render_utc("$team1 vs $team2", &rec, None), "Serral vs Maru");
	}

	#[test_log::test]
	fn test_file_name_appends_source_extension() {
		let rec = zvt();
		let name = Template::parse("$currentname").file_name(&rec, None);
		assert_eq!(name, "Ephemeron LE (3).SC2Replay");

		let mut bare = zvt();
		bare.source_path = "/replays/noext".into();
		assert_eq!(Template::parse("$map").file_name(&bare, None), "Ephemeron LE");
	}

	#[test_log::test]
	fn test_render_is_idempotent() {
		let rec = zvt();
		let t = Template::parse("$uniqueID $myteam v $oppteams $durationmins");
		assert_eq!(t.file_name(&rec, Some(2)), t.file_name(&rec, Some(2)));
	}

	#[test_log::test]
	fn test_display_round_trips_source() {
		let raw = "$myteam on $map";
		assert_eq!(Template::parse(raw).to_string(), raw);
		assert_eq!(Template::parse(raw).as_str(), raw);
	}
}
