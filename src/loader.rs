//! Reads automata from a minimal on-disk header/body text format (spec §6, concretized
//! in SPEC_FULL.md §4.9).
//!
//! spec.md treats the loader as a named external collaborator ("the core does not parse
//! or write these files") and leaves the format unspecified. This crate needs *some*
//! concrete format to be runnable end to end, so it defines one here, for its own
//! round-trip use only — nothing downstream depends on its exact shape beyond the
//! `Automaton` it produces.
//!
//! ```text
//! # header (.hdr)
//! alphabet: a,b,c
//! initial: 0
//! states: 0,1,2
//! marked: 2
//! ```
//! ```text
//! # body (.bdy)
//! 0 a 1
//! 1 b 2
//! 2 c 0
//! ```
//!
//! Every header in one verification run is expected to declare the same Σ (spec §6
//! precondition, unchecked by the core itself); [`load_directory`] builds one shared
//! [`Alphabet`] from the first header it reads and raises
//! [`VerificationError::MalformedAutomaton`] if a later header disagrees, since that
//! mismatch is detectable at load time even though the core's own operations are not
//! required to check it.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use crate::automaton::{Automaton, StateId};
use crate::error::VerificationError;
use crate::event::{alphabet_from_labels, Alphabet, Event, EventId};

/// Parses a header file's three declarations: `alphabet:`, `initial:`, `states:`, and
/// the optional `marked:` line.
struct Header {
    alphabet_labels: Vec<String>,
    initial: usize,
    states: BTreeSet<usize>,
    marked: BTreeSet<usize>,
}

fn parse_header(text: &str) -> Result<Header, VerificationError> {
    let mut alphabet_labels = None;
    let mut initial = None;
    let mut states = None;
    let mut marked = BTreeSet::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (key, value) = line
            .split_once(':')
            .ok_or_else(|| VerificationError::malformed(format!("unrecognised header line: {line:?}")))?;
        let value = value.trim();
        match key.trim() {
            "alphabet" => {
                alphabet_labels = Some(value.split(',').map(str::trim).map(String::from).collect());
            }
            "initial" => {
                initial = Some(value.parse::<usize>().map_err(|e| {
                    VerificationError::malformed(format!("bad initial state {value:?}: {e}"))
                })?);
            }
            "states" => {
                states = Some(
                    value
                        .split(',')
                        .map(|s| s.trim().parse::<usize>())
                        .collect::<Result<BTreeSet<usize>, _>>()
                        .map_err(|e| VerificationError::malformed(format!("bad states list: {e}")))?,
                );
            }
            "marked" => {
                if !value.is_empty() {
                    marked = value
                        .split(',')
                        .map(|s| s.trim().parse::<usize>())
                        .collect::<Result<BTreeSet<usize>, _>>()
                        .map_err(|e| VerificationError::malformed(format!("bad marked list: {e}")))?;
                }
            }
            other => {
                return Err(VerificationError::malformed(format!("unknown header key {other:?}")));
            }
        }
    }

    let alphabet_labels = alphabet_labels
        .ok_or_else(|| VerificationError::malformed("header is missing an 'alphabet:' line"))?;
    let initial = initial.ok_or_else(|| VerificationError::malformed("header is missing an 'initial:' line"))?;
    let states = states.ok_or_else(|| VerificationError::malformed("header is missing a 'states:' line"))?;
    if !states.contains(&initial) {
        return Err(VerificationError::malformed(format!(
            "initial state {initial} is not declared in 'states:'"
        )));
    }
    for m in &marked {
        if !states.contains(m) {
            return Err(VerificationError::malformed(format!(
                "marked state {m} is not declared in 'states:'"
            )));
        }
    }
    Ok(Header {
        alphabet_labels,
        initial,
        states,
        marked,
    })
}

/// Parses a body file's `source event target` lines.
fn parse_body(text: &str) -> Result<Vec<(usize, String, usize)>, VerificationError> {
    let mut transitions = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let [source, event, target] = parts.as_slice() else {
            return Err(VerificationError::malformed(format!("malformed transition line: {line:?}")));
        };
        let source = source
            .parse::<usize>()
            .map_err(|e| VerificationError::malformed(format!("bad source state {source:?}: {e}")))?;
        let target = target
            .parse::<usize>()
            .map_err(|e| VerificationError::malformed(format!("bad target state {target:?}: {e}")))?;
        transitions.push((source, event.to_string(), target));
    }
    Ok(transitions)
}

/// Loads a single automaton from a header/body pair against an already-built shared
/// [`Alphabet`]. `label` is used for diagnostics and as the automaton's
/// [`Automaton::label`].
pub fn load_with_alphabet(
    header_path: &Path,
    body_path: &Path,
    alphabet: &Alphabet,
    label: impl Into<String>,
) -> Result<Automaton, VerificationError> {
    let header_text = fs::read_to_string(header_path)
        .map_err(|e| VerificationError::malformed(format!("cannot read {}: {e}", header_path.display())))?;
    let body_text = fs::read_to_string(body_path)
        .map_err(|e| VerificationError::malformed(format!("cannot read {}: {e}", body_path.display())))?;
    let header = parse_header(&header_text)?;

    let label_to_event: BTreeMap<&str, EventId> =
        alphabet.iter().map(|e| (e.label(), e.id())).collect();

    let mut automaton = Automaton::new(label, Rc::clone(alphabet));
    // `Automaton::new` starts with exactly state 0; reuse it instead of allocating a
    // duplicate state 0 for headers whose `states:` line includes it.
    let mut remap: BTreeMap<usize, StateId> = BTreeMap::new();
    for &raw in &header.states {
        let marked = header.marked.contains(&raw);
        let id = if remap.is_empty() {
            automaton.set_marked(StateId(0), marked);
            StateId(0)
        } else {
            automaton.add_state(format!("q{raw}"), marked)
        };
        remap.insert(raw, id);
    }
    let initial = *remap
        .get(&header.initial)
        .ok_or_else(|| VerificationError::malformed(format!("initial state {} not found", header.initial)))?;
    automaton.set_initial_state(initial);

    for (raw_source, event_label, raw_target) in parse_body(&body_text)? {
        let source = *remap
            .get(&raw_source)
            .ok_or_else(|| VerificationError::malformed(format!("dangling transition source {raw_source}")))?;
        let target = *remap
            .get(&raw_target)
            .ok_or_else(|| VerificationError::malformed(format!("dangling transition target {raw_target}")))?;
        let event = *label_to_event
            .get(event_label.as_str())
            .ok_or_else(|| VerificationError::malformed(format!("event {event_label:?} not in alphabet")))?;
        automaton.add_transition(source, event, target);
    }

    tracing::debug!(
        header = %header_path.display(),
        states = automaton.num_states(),
        transitions = automaton.num_transitions(),
        "loaded automaton"
    );
    Ok(automaton)
}

/// Loads every `.hdr`/`.bdy` pair in `dir`, sharing one [`Alphabet`] built from the
/// first header read (spec §6's precondition that every automaton in a run declares the
/// same full Σ). Pairs are discovered by matching `<name>.hdr` with `<name>.bdy` and
/// visited in filename order for reproducibility.
pub fn load_directory(dir: &Path) -> Result<Vec<Automaton>, VerificationError> {
    let mut headers: Vec<(String, std::path::PathBuf)> = fs::read_dir(dir)
        .map_err(|e| VerificationError::malformed(format!("cannot read directory {}: {e}", dir.display())))?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("hdr") {
                let stem = path.file_stem()?.to_str()?.to_string();
                Some((stem, path))
            } else {
                None
            }
        })
        .collect();
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let mut alphabet: Option<Alphabet> = None;
    let mut out = Vec::with_capacity(headers.len());
    for (stem, header_path) in headers {
        let body_path = dir.join(format!("{stem}.bdy"));
        let header_text = fs::read_to_string(&header_path)
            .map_err(|e| VerificationError::malformed(format!("cannot read {}: {e}", header_path.display())))?;
        let labels = parse_header(&header_text)?.alphabet_labels;

        let shared: Alphabet = match &alphabet {
            Some(existing) => {
                let existing_labels: Vec<&str> = existing.iter().map(Event::label).collect();
                if existing_labels != labels.iter().map(String::as_str).collect::<Vec<_>>() {
                    return Err(VerificationError::malformed(format!(
                        "{} declares an alphabet that disagrees with earlier headers",
                        header_path.display()
                    )));
                }
                Rc::clone(existing)
            }
            None => {
                let built: Alphabet = Rc::from(alphabet_from_labels(labels, 1));
                alphabet = Some(Rc::clone(&built));
                built
            }
        };

        out.push(load_with_alphabet(&header_path, &body_path, &shared, stem)?);
    }
    Ok(out)
}

/// Builds `G_{Σ*}`, the universal automaton that accepts every string over `alphabet`:
/// one marked state with a self-loop on every event (spec §4.6 step 1, glossary
/// `G_{Σ*}`).
pub fn universal_automaton(alphabet: &Alphabet) -> Automaton {
    let mut g = Automaton::new("G_Sigma*", Rc::clone(alphabet));
    g.set_marked(StateId(0), true);
    for event in alphabet.iter() {
        g.add_transition(StateId(0), event.id(), StateId(0));
    }
    g
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_pair(dir: &Path, stem: &str, header: &str, body: &str) {
        let mut h = fs::File::create(dir.join(format!("{stem}.hdr"))).unwrap();
        h.write_all(header.as_bytes()).unwrap();
        let mut b = fs::File::create(dir.join(format!("{stem}.bdy"))).unwrap();
        b.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn loads_a_single_automaton_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        write_pair(
            dir.path(),
            "plant",
            "alphabet: a,b\ninitial: 0\nstates: 0,1\nmarked: 1\n",
            "0 a 1\n1 b 0\n",
        );
        let automata = load_directory(dir.path()).unwrap();
        assert_eq!(automata.len(), 1);
        let a = &automata[0];
        assert_eq!(a.num_states(), 2);
        assert_eq!(a.num_transitions(), 2);
        assert!(a.is_marked(a.successors(a.initial_state(), EventId(0)).next().unwrap()));
    }

    #[test]
    fn rejects_dangling_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        write_pair(
            dir.path(),
            "bad",
            "alphabet: a\ninitial: 5\nstates: 0,1\n",
            "0 a 1\n",
        );
        assert!(matches!(
            load_directory(dir.path()),
            Err(VerificationError::MalformedAutomaton(_))
        ));
    }

    #[test]
    fn rejects_disagreeing_alphabets_across_headers() {
        let dir = tempfile::tempdir().unwrap();
        write_pair(dir.path(), "one", "alphabet: a,b\ninitial: 0\nstates: 0\n", "");
        write_pair(dir.path(), "two", "alphabet: a,c\ninitial: 0\nstates: 0\n", "");
        assert!(matches!(
            load_directory(dir.path()),
            Err(VerificationError::MalformedAutomaton(_))
        ));
    }

    #[test]
    fn universal_automaton_self_loops_on_every_event() {
        let alphabet: Alphabet = Rc::from(alphabet_from_labels(["a", "b"], 1));
        let g = universal_automaton(&alphabet);
        assert!(g.is_marked(g.initial_state()));
        assert_eq!(g.successors(g.initial_state(), EventId(0)).count(), 1);
        assert_eq!(g.successors(g.initial_state(), EventId(1)).count(), 1);
    }
}
