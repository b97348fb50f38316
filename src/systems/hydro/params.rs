// parameter resolution
// raw (possibly string-typed) values in, a fully populated numeric record out

use std::collections::BTreeMap;
use std::fmt;

use bevy::prelude::*;
use serde::Deserialize;

use crate::error::GenerationError;

/// Value as it arrives from a config file: a JSON number or a string.
/// Anything else (null, booleans, arrays) is kept as `Other` and never coerces.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Int(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Int(v) => write!(f, "{}", v),
            RawValue::Float(v) => write!(f, "{}", v),
            RawValue::Text(v) => write!(f, "{}", v),
            RawValue::Other(v) => write!(f, "{}", v),
        }
    }
}

pub type RawParams = BTreeMap<String, RawValue>;

/// A resolved parameter value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
}

impl ParamValue {
    pub fn as_f32(self) -> f32 {
        match self {
            ParamValue::Int(v) => v as f32,
            ParamValue::Float(v) => v as f32,
        }
    }

    /// Counts are integers; a float count is truncated toward zero.
    pub fn as_count(self) -> i64 {
        match self {
            ParamValue::Int(v) => v,
            ParamValue::Float(v) => v as i64,
        }
    }
}

/// Value substituted when a supplied value cannot be coerced.
pub const FALLBACK_VALUE: ParamValue = ParamValue::Int(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    Int,
    Float,
}

/// One schema row: name, type, default, and the advisory range the
/// configuration collector is expected to enforce.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub default: f64,
    pub min: f64,
    pub max: f64,
}

impl ParamSpec {
    pub const fn float(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self { name, ty: ParamType::Float, default, min, max }
    }

    pub const fn int(name: &'static str, default: i64, min: i64, max: i64) -> Self {
        Self { name, ty: ParamType::Int, default: default as f64, min: min as f64, max: max as f64 }
    }

    pub fn default_value(&self) -> ParamValue {
        match self.ty {
            ParamType::Int => ParamValue::Int(self.default as i64),
            ParamType::Float => ParamValue::Float(self.default),
        }
    }
}

pub const GENERATOR_SCHEMA: &[ParamSpec] = &[
    ParamSpec::float("stator_radius", 5.0, 0.1, 20.0),
    ParamSpec::float("stator_height", 3.0, 0.1, 10.0),
    ParamSpec::float("rotor_radius", 3.0, 0.1, 15.0),
    ParamSpec::float("rotor_height", 2.0, 0.1, 8.0),
    ParamSpec::float("shaft_radius", 0.5, 0.1, 3.0),
    ParamSpec::float("shaft_height", 8.0, 1.0, 20.0),
    ParamSpec::float("base_radius", 7.0, 1.0, 15.0),
    ParamSpec::float("base_height", 1.0, 0.1, 5.0),
];

pub const TURBINE_SCHEMA: &[ParamSpec] = &[
    ParamSpec::float("spiral_major_radius", 4.0, 1.0, 10.0),
    ParamSpec::float("spiral_minor_radius", 0.8, 0.1, 3.0),
    ParamSpec::int("stay_vane_count", 12, 4, 24),
    ParamSpec::int("guide_vane_count", 16, 8, 32),
    ParamSpec::float("runner_radius", 1.5, 0.5, 5.0),
    ParamSpec::float("runner_depth", 1.0, 0.2, 3.0),
    ParamSpec::int("blade_count", 6, 3, 12),
    ParamSpec::float("blade_radius", 0.3, 0.1, 1.0),
    ParamSpec::float("blade_depth", 0.4, 0.1, 2.0),
    ParamSpec::float("shaft_radius", 0.4, 0.1, 2.0),
    ParamSpec::float("shaft_height", 6.0, 2.0, 15.0),
    ParamSpec::float("draft_radius1", 1.2, 0.5, 3.0),
    ParamSpec::float("draft_radius2", 2.0, 0.5, 5.0),
    ParamSpec::float("draft_depth", 3.0, 1.0, 8.0),
];

pub const INTAKE_SCHEMA: &[ParamSpec] = &[
    ParamSpec::int("bay_count", 3, 1, 10),
    ParamSpec::float("bay_width", 4.0, 2.0, 10.0),
    ParamSpec::float("pier_thick", 1.0, 0.5, 3.0),
    ParamSpec::float("intake_height", 8.0, 4.0, 20.0),
    ParamSpec::float("sill_elev", 2.0, 1.0, 6.0),
    ParamSpec::float("deck_elev", 10.0, 6.0, 20.0),
    ParamSpec::float("face_thick", 0.5, 0.2, 2.0),
    ParamSpec::float("trash_bar_thick", 0.1, 0.05, 0.3),
    ParamSpec::float("trash_bar_gap", 0.15, 0.05, 0.4),
    ParamSpec::int("trash_bar_rows", 4, 1, 8),
    ParamSpec::float("gate_thick", 0.3, 0.1, 1.0),
    ParamSpec::float("gate_clear_top", 2.0, 0.5, 5.0),
    ParamSpec::float("tunnel_diam", 2.5, 1.0, 6.0),
    ParamSpec::float("tunnel_len", 10.0, 5.0, 30.0),
    ParamSpec::float("floor_elev", 0.0, -2.0, 2.0),
    ParamSpec::float("water_elev_up", 7.0, 3.0, 15.0),
    ParamSpec::float("side_wall_extra", 1.0, 0.5, 3.0),
    ParamSpec::float("struct_depth", 6.0, 3.0, 12.0),
    ParamSpec::float("crane_gauge", 2.0, 1.0, 4.0),
    ParamSpec::float("crane_span_xpad", 1.0, 0.5, 3.0),
    // timeline
    ParamSpec::int("frame_start", 1, 0, 10_000),
    ParamSpec::int("frame_gate_up", 50, 0, 10_000),
    ParamSpec::int("frame_trolley_1", 1, 0, 10_000),
    ParamSpec::int("frame_trolley_2", 100, 0, 10_000),
    ParamSpec::int("frame_end", 100, 0, 10_000),
];

/// Which builder strategy and parameter schema apply to a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Generator,
    Turbine,
    Intake,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 3] = [ComponentKind::Generator, ComponentKind::Turbine, ComponentKind::Intake];

    /// Returns `None` for names that are not a known component.
    /// `intake_structure` is accepted as well, it is what the parameter-entry front end writes.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "generator" => Some(ComponentKind::Generator),
            "turbine" => Some(ComponentKind::Turbine),
            "intake" | "intake_structure" => Some(ComponentKind::Intake),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentKind::Generator => "generator",
            ComponentKind::Turbine => "turbine",
            ComponentKind::Intake => "intake",
        }
    }

    pub fn schema(self) -> &'static [ParamSpec] {
        match self {
            ComponentKind::Generator => GENERATOR_SCHEMA,
            ComponentKind::Turbine => TURBINE_SCHEMA,
            ComponentKind::Intake => INTAKE_SCHEMA,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What to do when a supplied value is not numeric.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolvePolicy {
    /// Substitute `FALLBACK_VALUE` and record it.
    #[default]
    Permissive,
    /// Reject the request with `GenerationError::UnparsableValue`.
    Strict,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamOutcome {
    Supplied,
    Defaulted,
    Fallback { raw: String },
}

/// Per-key audit trail of a resolve pass, in schema order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolutionReport {
    pub entries: Vec<(&'static str, ParamOutcome)>,
}

impl ResolutionReport {
    pub fn defaulted(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter()
            .filter(|(_, outcome)| *outcome == ParamOutcome::Defaulted)
            .map(|(key, _)| *key)
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.entries.iter().filter_map(|(key, outcome)| match outcome {
            ParamOutcome::Fallback { raw } => Some((*key, raw.as_str())),
            _ => None,
        })
    }

    pub fn is_clean(&self) -> bool {
        self.entries.iter().all(|(_, outcome)| *outcome == ParamOutcome::Supplied)
    }
}

/// Resolved, immutable parameter set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterRecord {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterRecord {
    pub fn get(&self, key: &str) -> Option<ParamValue> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn require(&self, key: &str) -> Result<ParamValue, GenerationError> {
        self.get(key).ok_or_else(|| GenerationError::MissingParameter(key.to_string()))
    }

    pub fn float(&self, key: &str) -> Result<f32, GenerationError> {
        self.require(key).map(ParamValue::as_f32)
    }

    pub fn count(&self, key: &str) -> Result<i64, GenerationError> {
        self.require(key).map(ParamValue::as_count)
    }

    /// Frame indices are non-negative; a negative value is read as frame 0.
    pub fn frame(&self, key: &str) -> Result<u32, GenerationError> {
        self.count(key).map(|v| v.clamp(0, u32::MAX as i64) as u32)
    }
}

/// Coerce one raw value: text with a decimal point is a float, other text an integer.
/// Returns `None` when the value is not numeric (or not finite).
pub fn coerce(raw: &RawValue) -> Option<ParamValue> {
    match raw {
        RawValue::Int(v) => Some(ParamValue::Int(*v)),
        RawValue::Float(v) => v.is_finite().then_some(ParamValue::Float(*v)),
        RawValue::Text(text) => {
            let text = text.trim();
            if text.contains('.') {
                text.parse::<f64>().ok()
                    .filter(|v| v.is_finite())
                    .map(ParamValue::Float)
            } else {
                text.parse::<i64>().ok().map(ParamValue::Int)
            }
        }
        RawValue::Other(_) => None,
    }
}

/// Resolves every schema key against the raw input.
/// Under `ResolvePolicy::Permissive` this never fails.
pub fn resolve(
    raw: &RawParams,
    schema: &[ParamSpec],
    policy: ResolvePolicy,
) -> Result<(ParameterRecord, ResolutionReport), GenerationError> {
    let mut values = BTreeMap::new();
    let mut report = ResolutionReport::default();

    for spec in schema {
        let (value, outcome) = match raw.get(spec.name) {
            None => (spec.default_value(), ParamOutcome::Defaulted),
            Some(raw_value) => match coerce(raw_value) {
                Some(value) => (value, ParamOutcome::Supplied),
                None => {
                    if policy == ResolvePolicy::Strict {
                        return Err(GenerationError::UnparsableValue {
                            key: spec.name.to_string(),
                            raw: raw_value.to_string(),
                        });
                    }
                    warn!("parameter `{}`: {:?} is not numeric, using {:?}", spec.name, raw_value.to_string(), FALLBACK_VALUE);
                    (FALLBACK_VALUE, ParamOutcome::Fallback { raw: raw_value.to_string() })
                }
            },
        };
        values.insert(spec.name.to_string(), value);
        report.entries.push((spec.name, outcome));
    }

    for key in raw.keys() {
        if !schema.iter().any(|spec| spec.name == key) {
            debug!("ignoring parameter `{}`, not part of this schema", key);
        }
    }

    Ok((ParameterRecord { values }, report))
}

/// Advisory range check, only meant for the configuration boundary.
/// Logs and returns the offending keys; values are never clamped.
pub fn check_ranges(record: &ParameterRecord, schema: &[ParamSpec]) -> Vec<&'static str> {
    let mut out_of_range = Vec::new();
    for spec in schema {
        let Some(value) = record.get(spec.name) else {
            continue;
        };
        let v = match value {
            ParamValue::Int(v) => v as f64,
            ParamValue::Float(v) => v,
        };
        if v < spec.min || v > spec.max {
            warn!("parameter `{}` = {} is outside the advised range {}..={}", spec.name, v, spec.min, spec.max);
            out_of_range.push(spec.name);
        }
    }
    out_of_range
}

// typed records, built once per request
// the calculators and builders only ever see these

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorParams {
    pub stator_radius: f32,
    pub stator_height: f32,
    pub rotor_radius: f32,
    pub rotor_height: f32,
    pub shaft_radius: f32,
    pub shaft_height: f32,
    pub base_radius: f32,
    pub base_height: f32,
}

impl GeneratorParams {
    pub fn from_record(r: &ParameterRecord) -> Result<Self, GenerationError> {
        Ok(Self {
            stator_radius: r.float("stator_radius")?,
            stator_height: r.float("stator_height")?,
            rotor_radius: r.float("rotor_radius")?,
            rotor_height: r.float("rotor_height")?,
            shaft_radius: r.float("shaft_radius")?,
            shaft_height: r.float("shaft_height")?,
            base_radius: r.float("base_radius")?,
            base_height: r.float("base_height")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurbineParams {
    pub spiral_major_radius: f32,
    pub spiral_minor_radius: f32,
    pub stay_vane_count: i64,
    pub guide_vane_count: i64,
    pub runner_radius: f32,
    pub runner_depth: f32,
    pub blade_count: i64,
    pub blade_radius: f32,
    pub blade_depth: f32,
    pub shaft_radius: f32,
    pub shaft_height: f32,
    pub draft_radius1: f32,
    pub draft_radius2: f32,
    pub draft_depth: f32,
}

impl TurbineParams {
    pub fn from_record(r: &ParameterRecord) -> Result<Self, GenerationError> {
        Ok(Self {
            spiral_major_radius: r.float("spiral_major_radius")?,
            spiral_minor_radius: r.float("spiral_minor_radius")?,
            stay_vane_count: r.count("stay_vane_count")?,
            guide_vane_count: r.count("guide_vane_count")?,
            runner_radius: r.float("runner_radius")?,
            runner_depth: r.float("runner_depth")?,
            blade_count: r.count("blade_count")?,
            blade_radius: r.float("blade_radius")?,
            blade_depth: r.float("blade_depth")?,
            shaft_radius: r.float("shaft_radius")?,
            shaft_height: r.float("shaft_height")?,
            draft_radius1: r.float("draft_radius1")?,
            draft_radius2: r.float("draft_radius2")?,
            draft_depth: r.float("draft_depth")?,
        })
    }
}

/// Key frames of the intake animation timeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntakeTimeline {
    pub start: u32,
    pub gate_up: u32,
    pub trolley_1: u32,
    pub trolley_2: u32,
    pub end: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntakeParams {
    pub bay_count: i64,
    pub bay_width: f32,
    pub pier_thick: f32,
    pub intake_height: f32,
    pub sill_elev: f32,
    pub deck_elev: f32,
    pub face_thick: f32,
    pub trash_bar_thick: f32,
    pub trash_bar_gap: f32,
    pub trash_bar_rows: i64,
    pub gate_thick: f32,
    pub gate_clear_top: f32,
    pub tunnel_diam: f32,
    pub tunnel_len: f32,
    pub floor_elev: f32,
    pub water_elev_up: f32,
    pub side_wall_extra: f32,
    pub struct_depth: f32,
    pub crane_gauge: f32,
    pub crane_span_xpad: f32,
    pub timeline: IntakeTimeline,
}

impl IntakeParams {
    pub fn from_record(r: &ParameterRecord) -> Result<Self, GenerationError> {
        Ok(Self {
            bay_count: r.count("bay_count")?,
            bay_width: r.float("bay_width")?,
            pier_thick: r.float("pier_thick")?,
            intake_height: r.float("intake_height")?,
            sill_elev: r.float("sill_elev")?,
            deck_elev: r.float("deck_elev")?,
            face_thick: r.float("face_thick")?,
            trash_bar_thick: r.float("trash_bar_thick")?,
            trash_bar_gap: r.float("trash_bar_gap")?,
            trash_bar_rows: r.count("trash_bar_rows")?,
            gate_thick: r.float("gate_thick")?,
            gate_clear_top: r.float("gate_clear_top")?,
            tunnel_diam: r.float("tunnel_diam")?,
            tunnel_len: r.float("tunnel_len")?,
            floor_elev: r.float("floor_elev")?,
            water_elev_up: r.float("water_elev_up")?,
            side_wall_extra: r.float("side_wall_extra")?,
            struct_depth: r.float("struct_depth")?,
            crane_gauge: r.float("crane_gauge")?,
            crane_span_xpad: r.float("crane_span_xpad")?,
            timeline: IntakeTimeline {
                start: r.frame("frame_start")?,
                gate_up: r.frame("frame_gate_up")?,
                trolley_1: r.frame("frame_trolley_1")?,
                trolley_2: r.frame("frame_trolley_2")?,
                end: r.frame("frame_end")?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, RawValue)]) -> RawParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn unparsable_text_falls_back_to_one() {
        let input = raw(&[("blade_count", RawValue::Text("abc".into()))]);
        let (record, report) = resolve(&input, TURBINE_SCHEMA, ResolvePolicy::Permissive).unwrap();

        assert_eq!(record.get("blade_count"), Some(ParamValue::Int(1)));
        let fallbacks: Vec<_> = report.fallbacks().collect();
        assert_eq!(fallbacks, vec![("blade_count", "abc")]);
    }

    #[test]
    fn null_and_boolean_values_fall_back_like_text() {
        let input: RawParams = serde_json::from_str(r#"{"blade_count": null, "stay_vane_count": true}"#).unwrap();
        let (record, report) = resolve(&input, TURBINE_SCHEMA, ResolvePolicy::Permissive).unwrap();

        assert_eq!(record.get("blade_count"), Some(ParamValue::Int(1)));
        assert_eq!(record.get("stay_vane_count"), Some(ParamValue::Int(1)));
        let mut fallbacks: Vec<_> = report.fallbacks().collect();
        fallbacks.sort();
        assert_eq!(fallbacks, vec![("blade_count", "null"), ("stay_vane_count", "true")]);
    }

    #[test]
    fn strict_policy_rejects_unparsable_text() {
        let input = raw(&[("blade_count", RawValue::Text("abc".into()))]);
        let err = resolve(&input, TURBINE_SCHEMA, ResolvePolicy::Strict).unwrap_err();
        assert_eq!(err, GenerationError::UnparsableValue { key: "blade_count".into(), raw: "abc".into() });
    }

    #[test]
    fn decimal_point_decides_the_numeric_type() {
        assert_eq!(coerce(&RawValue::Text("3".into())), Some(ParamValue::Int(3)));
        assert_eq!(coerce(&RawValue::Text("3.0".into())), Some(ParamValue::Float(3.0)));
        assert_eq!(coerce(&RawValue::Text(" -2.5 ".into())), Some(ParamValue::Float(-2.5)));
        // exponent without a decimal point is read as an integer and fails
        assert_eq!(coerce(&RawValue::Text("1e3".into())), None);
        assert_eq!(coerce(&RawValue::Text("nan.".into())), None);
        assert_eq!(coerce(&RawValue::Float(f64::INFINITY)), None);
    }

    #[test]
    fn absent_keys_take_schema_defaults() {
        let (record, report) = resolve(&RawParams::new(), GENERATOR_SCHEMA, ResolvePolicy::Permissive).unwrap();

        assert_eq!(record.len(), GENERATOR_SCHEMA.len());
        assert_eq!(record.get("stator_radius"), Some(ParamValue::Float(5.0)));
        assert_eq!(report.defaulted().count(), GENERATOR_SCHEMA.len());
    }

    #[test]
    fn int_defaults_stay_integers() {
        let (record, _) = resolve(&RawParams::new(), INTAKE_SCHEMA, ResolvePolicy::Permissive).unwrap();
        assert_eq!(record.get("bay_count"), Some(ParamValue::Int(3)));
        assert_eq!(record.get("frame_gate_up"), Some(ParamValue::Int(50)));
    }

    #[test]
    fn keys_outside_the_schema_are_ignored() {
        let input = raw(&[("warp_factor", RawValue::Int(9))]);
        let (record, _) = resolve(&input, GENERATOR_SCHEMA, ResolvePolicy::Permissive).unwrap();
        assert_eq!(record.get("warp_factor"), None);
    }

    #[test]
    fn typed_record_reports_missing_keys() {
        let schema = [ParamSpec::float("stator_radius", 5.0, 0.1, 20.0)];
        let (record, _) = resolve(&RawParams::new(), &schema, ResolvePolicy::Permissive).unwrap();
        let err = GeneratorParams::from_record(&record).unwrap_err();
        assert_eq!(err, GenerationError::MissingParameter("stator_height".into()));
    }

    #[test]
    fn float_counts_truncate_and_negative_frames_clamp() {
        let input = raw(&[
            ("bay_count", RawValue::Float(2.9)),
            ("frame_start", RawValue::Int(-5)),
        ]);
        let (record, _) = resolve(&input, INTAKE_SCHEMA, ResolvePolicy::Permissive).unwrap();
        let params = IntakeParams::from_record(&record).unwrap();
        assert_eq!(params.bay_count, 2);
        assert_eq!(params.timeline.start, 0);
    }

    #[test]
    fn range_check_flags_but_keeps_values() {
        let input = raw(&[("bay_count", RawValue::Int(40))]);
        let (record, _) = resolve(&input, INTAKE_SCHEMA, ResolvePolicy::Permissive).unwrap();
        assert_eq!(check_ranges(&record, INTAKE_SCHEMA), vec!["bay_count"]);
        assert_eq!(record.get("bay_count"), Some(ParamValue::Int(40)));
    }

    #[test]
    fn component_names_parse_case_insensitively() {
        assert_eq!(ComponentKind::parse("Turbine"), Some(ComponentKind::Turbine));
        assert_eq!(ComponentKind::parse("intake_structure"), Some(ComponentKind::Intake));
        assert_eq!(ComponentKind::parse("foo"), None);
    }
}
