//! BILOU chunk encoding.
//!
//! Named entities are tagged `B-X` (begin), `I-X` (inside), `L-X` (last),
//! `U-X` (unit) or `O` (outside).

/// Position of a token inside a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bilou {
    B,
    I,
    L,
    O,
    U,
}

impl Bilou {
    fn as_char(self) -> char {
        match self {
            Self::B => 'B',
            Self::I => 'I',
            Self::L => 'L',
            Self::O => 'O',
            Self::U => 'U',
        }
    }
}

/// Splits a tag into its position and entity type. Anything that is not a
/// well-formed chunk tag is treated as `O`.
pub fn parse(tag: &str) -> (Bilou, &str) {
    let bilou = match tag.as_bytes() {
        [b'B', b'-', ..] => Bilou::B,
        [b'I', b'-', ..] => Bilou::I,
        [b'L', b'-', ..] => Bilou::L,
        [b'U', b'-', ..] => Bilou::U,
        _ => return (Bilou::O, ""),
    };
    (bilou, &tag[2..])
}

pub fn tag(bilou: Bilou, entity_type: &str) -> String {
    match bilou {
        Bilou::O => "O".to_string(),
        _ => format!("{}-{}", bilou.as_char(), entity_type),
    }
}

/// Entity chunks as `(first, last, type)`, indices into `tags`.
pub fn collect_chunks<S: AsRef<str>>(tags: &[Option<S>]) -> Vec<(usize, usize, String)> {
    let mut chunks = Vec::new();
    let mut open: Option<(usize, &str)> = None;

    for (i, t) in tags.iter().enumerate() {
        let (bilou, ty) = t.as_ref().map_or((Bilou::O, ""), |t| parse(t.as_ref()));
        match bilou {
            Bilou::U => {
                chunks.push((i, i, ty.to_string()));
                open = None;
            }
            Bilou::B => open = Some((i, ty)),
            Bilou::I => {
                if open.is_some_and(|(_, o)| o != ty) {
                    open = None;
                }
            }
            Bilou::L => {
                if let Some((begin, o)) = open {
                    if o == ty {
                        chunks.push((begin, i, ty.to_string()));
                    }
                }
                open = None;
            }
            Bilou::O => open = None,
        }
    }
    chunks
}

/// Rewrites ill-formed tag sequences: chunks that are never closed get a
/// last tag, chunks that are never opened get a begin tag, and single-token
/// chunks become unit tags.
pub fn repair<S: AsRef<str>>(tags: &[Option<S>]) -> Vec<Option<String>> {
    let parsed: Vec<(Bilou, String)> = tags
        .iter()
        .map(|t| match t {
            Some(t) => {
                let (b, ty) = parse(t.as_ref());
                (b, ty.to_string())
            }
            None => (Bilou::O, String::new()),
        })
        .collect();

    let mut out: Vec<Option<String>> = Vec::with_capacity(tags.len());
    let mut prev = (Bilou::O, String::new());

    for (i, (bilou, ty)) in parsed.iter().enumerate() {
        let open = matches!(prev.0, Bilou::B | Bilou::I) && prev.1 == *ty;
        let continues = parsed
            .get(i + 1)
            .is_some_and(|(b, t)| matches!(b, Bilou::I | Bilou::L) && t == ty);

        let fixed = match bilou {
            Bilou::B | Bilou::I => match (open, continues) {
                (true, true) => Bilou::I,
                (true, false) => Bilou::L,
                (false, true) => Bilou::B,
                (false, false) => Bilou::U,
            },
            Bilou::L if !open => Bilou::U,
            other => *other,
        };

        out.push(match (&tags[i], fixed) {
            (None, _) => None,
            (Some(t), Bilou::O) => Some(t.as_ref().to_string()),
            (Some(_), b) => Some(tag(b, ty)),
        });
        prev = (fixed, ty.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(s: &[&str]) -> Vec<Option<String>> {
        s.iter().map(|t| Some(t.to_string())).collect()
    }

    #[test]
    fn test_collect_chunks() {
        let t = tags(&["O", "B-PER", "I-PER", "L-PER", "U-LOC", "B-ORG", "O", "L-ORG"]);
        assert_eq!(
            collect_chunks(&t),
            vec![(1, 3, "PER".to_string()), (4, 4, "LOC".to_string())]
        );
    }

    #[test]
    fn test_repair() {
        assert_eq!(repair(&tags(&["B-PER", "O"])), tags(&["U-PER", "O"]));
        assert_eq!(repair(&tags(&["I-LOC", "L-LOC"])), tags(&["B-LOC", "L-LOC"]));
        assert_eq!(
            repair(&tags(&["B-ORG", "I-ORG", "O"])),
            tags(&["B-ORG", "L-ORG", "O"])
        );
        assert_eq!(repair(&tags(&["L-X"])), tags(&["U-X"]));
        assert_eq!(
            repair(&tags(&["B-PER", "L-LOC"])),
            tags(&["U-PER", "U-LOC"])
        );
        let well_formed = tags(&["B-PER", "I-PER", "L-PER", "U-LOC", "O"]);
        assert_eq!(repair(&well_formed), well_formed);
    }
}
