//! Normalization of type names as they appear in the metadata, e.g.
//! `Vec<<T as Trait>::Balance>` or `<T::Lookup as StaticLookup>::Source`.

/// Returns the canonical form of a type name. The result is still case
/// sensitive; registry lookups additionally ignore the case.
pub fn normalize(name: &str) -> String {
    let mut name = name.trim().replace("<T::Lookup as StaticLookup>::Source", "LookupSource");

    name = strip_qualified_paths(&name);
    name.retain(|c| !c.is_whitespace());
    name = strip_system_prefix(&name);

    for generic in &["<T>", "<T,I>"] {
        name = name.replace(generic, "");
    }

    if name == "&'static[u8]" {
        return "Bytes".to_string();
    }

    name
}

// `<T as Trait>::Balance` becomes `Balance`.
fn strip_qualified_paths(name: &str) -> String {
    let mut name = name.to_string();

    while let Some(as_pos) = name.find(" as ") {
        let open = match name[..as_pos].rfind('<') {
            Some(open) => open,
            None => break,
        };
        let close = match name[as_pos..].find(">::") {
            Some(close) => as_pos + close + 3,
            None => break,
        };

        name.replace_range(open..close, "");
    }

    name
}

// `T::AccountId` becomes `AccountId`, `AT::Foo` is left alone.
fn strip_system_prefix(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;

    while let Some(pos) = rest.find("T::") {
        let boundary = rest[..pos]
            .chars()
            .last()
            .map(|c| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(true);

        out.push_str(&rest[..pos]);
        if !boundary {
            out.push_str("T::");
        }
        rest = &rest[pos + 3..];
    }

    out.push_str(rest);
    out
}

/// Splits the type name into its base and the generic parameters, e.g.
/// `BTreeMap<K,V>` into `("BTreeMap", ["K", "V"])`. Returns `None` if the
/// name is not generic.
pub fn split_generic(name: &str) -> Option<(&str, Vec<&str>)> {
    if !name.ends_with('>') {
        return None;
    }

    let open = name.find('<')?;
    let base = &name[..open];
    if base.is_empty() {
        return None;
    }

    Some((base, split_top_level(&name[open + 1..name.len() - 1])))
}

/// Splits on commas which are not nested within `<>`, `()` or `[]`.
pub fn split_top_level(list: &str) -> Vec<&str> {
    let mut parts = vec![];
    let mut depth = 0i32;
    let mut start = 0;

    for (pos, c) in list.char_indices() {
        match c {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&list[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }

    let last = &list[start..];
    if !last.is_empty() {
        parts.push(last);
    }

    parts
}
