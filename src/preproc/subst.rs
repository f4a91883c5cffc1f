// STD Dependencies -----------------------------------------------------------
use std::collections::HashMap;


// Types ----------------------------------------------------------------------
/// One pending parameterized macro reference whose arguments are still being
/// collected. These stack so that a reference inside another reference's
/// argument list finishes first.
#[derive(Debug)]
pub struct DefRef {
    pub name: String,
    pub params: String,
    pub next_arg: String,
    pub args: Vec<String>,
    /// Suspended paren depth of the *enclosing* reference, restored when
    /// this one completes.
    pub paren_level: usize
}

impl DefRef {

    pub fn new(name: String, params: String) -> Self {
        Self {
            name,
            params,
            next_arg: String::new(),
            args: Vec::new(),
            paren_level: 0
        }
    }

}


// Expansion Engine -----------------------------------------------------------
pub fn trim_whitespace(text: &str, trailing: bool) -> String {
    let out = text.trim_start_matches(|c: char| c.is_ascii_whitespace());
    let out = if trailing {
        out.trim_end_matches(|c: char| c.is_ascii_whitespace())

    } else {
        out
    };
    out.to_string()
}

/// Substitutes actual arguments into a macro body. A pure function of the
/// reference (formals source plus collected actuals) and the stored body;
/// diagnostics go into `errors` and a recoverable `` ` name `` stub is
/// returned when the argument list does not line up.
pub fn define_subst(refr: &DefRef, value: &str, errors: &mut Vec<String>) -> String {

    // Parse the formal list into name -> effective value. A single counter
    // covers (), {} and [] since Verilog guarantees matched pairs; the
    // leading ( and trailing ) put level 1 at the top of the list.
    let mut arg_value_by_name: HashMap<String, String> = HashMap::new();
    let mut num_args = 0;
    {
        let mut arg_name = String::new();
        let mut token = String::new();
        let mut paren: usize = 1;
        let mut quote = false;
        let mut have_default = false;
        let chars: Vec<char> = refr.params.chars().collect();
        let mut i = if chars.first() == Some(&'(') { 1 } else { 0 };
        while i < chars.len() {
            let c = chars[i];
            if !quote && paren == 1 {
                if c == ')' || c == ',' {
                    let mut value = String::new();
                    if have_default {
                        value = token.clone();

                    } else {
                        arg_name = token.clone();
                    }
                    arg_name = trim_whitespace(&arg_name, true);
                    if !arg_name.is_empty() {
                        if refr.args.len() > num_args {
                            // A call `def( a ) must equal `def(a ); only the
                            // leading whitespace is trimmed, as other
                            // simulators keep the trailing part
                            let arg = trim_whitespace(&refr.args[num_args], false);
                            if !arg.is_empty() {
                                value = arg;
                            }

                        } else if !have_default {
                            errors.push(format!("Define missing argument '{}' for: {}", arg_name, refr.name));
                            return format!(" `{} ", refr.name);
                        }
                        num_args += 1;
                    }
                    arg_value_by_name.insert(arg_name.clone(), value);
                    arg_name.clear();
                    token.clear();
                    have_default = false;
                    i += 1;
                    continue;

                } else if c == '=' {
                    have_default = true;
                    arg_name = token.clone();
                    token.clear();
                    i += 1;
                    continue;
                }
            }
            if c == '\\' && i + 1 < chars.len() {
                // \{any} is a literal pair
                token.push(c);
                token.push(chars[i + 1]);
                i += 2;
                continue;
            }
            if !quote {
                if c == '(' || c == '{' || c == '[' {
                    paren += 1;

                } else if c == ')' || c == '}' || c == ']' {
                    paren = paren.saturating_sub(1);
                }
            }
            if c == '"' {
                quote = !quote;
            }
            token.push(c);
            i += 1;
        }
    }
    if refr.args.len() > num_args
        // `define X() may be called with nothing at all
        && !(refr.args.len() == 1 && num_args == 0 && trim_whitespace(&refr.args[0], false).is_empty()) {
        errors.push(format!("Define passed too many arguments: {}", refr.name));
        return format!(" `{} ", refr.name);
    }

    // Walk the body, substituting formals and resolving the directive-aware
    // escapes
    let mut out = String::with_capacity(value.len());
    let mut arg_name = String::new();
    let mut quote = false;
    let chars: Vec<char> = value.chars().collect();
    let mut i = 0;
    loop {
        let c = chars.get(i).copied();
        if let Some(c) = c {
            if !quote
                // $ never collides with a formal, so system functions survive
                && (c.is_ascii_alphabetic() || c == '_' || c == '$'
                    || (!arg_name.is_empty() && c.is_ascii_digit())) {
                arg_name.push(c);
                i += 1;
                continue;
            }
        }
        if !arg_name.is_empty() {
            match arg_value_by_name.get(&arg_name) {
                Some(subst) => out.push_str(subst),
                None => out.push_str(&arg_name)
            }
            arg_name.clear();
        }
        let c = match c {
            None => break,
            Some(c) => c
        };
        if !quote {
            // Checked only after the end of a possible argument name
            if c == '`' && chars.get(i + 1) == Some(&'`') {
                // Token paste: the separator itself vanishes
                i += 2;
                continue;

            } else if c == '`' && chars.get(i + 1) == Some(&'"') {
                // Emit a " without entering quote mode
                out.push('"');
                i += 2;
                continue;

            } else if c == '`' && chars.get(i + 1) == Some(&'\\') {
                out.push('\\');
                i += 2;
                continue;
            }
        }
        if c == '\\' && chars.get(i + 1).is_some() {
            out.push(c);
            out.push(chars[i + 1]);
            i += 2;
            continue;
        }
        if c == '"' {
            quote = !quote;
        }
        out.push(c);
        i += 1;
    }
    out
}


// Tests ----------------------------------------------------------------------
#[cfg(test)]
mod test {
    use super::{define_subst, trim_whitespace, DefRef};

    fn subst(params: &str, args: Vec<&str>, value: &str) -> (String, Vec<String>) {
        let mut refr = DefRef::new("M".to_string(), params.to_string());
        refr.args = args.into_iter().map(|arg| arg.to_string()).collect();
        let mut errors = Vec::new();
        let out = define_subst(&refr, value, &mut errors);
        (out, errors)
    }

    #[test]
    fn test_trim_whitespace() {
        assert_eq!(trim_whitespace("  a b ", false), "a b ");
        assert_eq!(trim_whitespace("  a b ", true), "a b");
        assert_eq!(trim_whitespace("\t\n", true), "");
    }

    #[test]
    fn test_simple_substitution() {
        let (out, errors) = subst("(a,b)", vec!["1", "2"], "a+b");
        assert_eq!(out, "1+2");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_default_arguments() {
        let (out, errors) = subst("(a,b=9)", vec!["7"], "a+b");
        assert_eq!(out, "7+9");
        assert!(errors.is_empty());
        let (out, _) = subst("(a,b=9)", vec!["7", "1"], "a+b");
        assert_eq!(out, "7+1");
    }

    #[test]
    fn test_empty_actual_takes_default() {
        let (out, errors) = subst("(a=4,b=6)", vec!["", "2"], "a-b");
        assert_eq!(out, "4-2");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_missing_argument_stub() {
        let (out, errors) = subst("(a,b)", vec!["1"], "a+b");
        assert_eq!(out, " `M ");
        assert_eq!(errors, vec!["Define missing argument 'b' for: M".to_string()]);
    }

    #[test]
    fn test_too_many_arguments_stub() {
        let (out, errors) = subst("(a)", vec!["1", "2"], "a");
        assert_eq!(out, " `M ");
        assert_eq!(errors, vec!["Define passed too many arguments: M".to_string()]);
    }

    #[test]
    fn test_empty_formal_allows_zero_actuals() {
        // `define X() called as `X() arrives with one empty collected actual
        let (out, errors) = subst("()", vec![" "], "body");
        assert_eq!(out, "body");
        assert!(errors.is_empty());
        // while an empty actual for a real formal substitutes as empty
        let (out, errors) = subst("(a)", vec![" "], "a!");
        assert_eq!(out, "!");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_leading_trim_only() {
        let (out, errors) = subst("(a)", vec!["  x  "], "[a]");
        assert_eq!(out, "[x  ]");
        assert!(errors.is_empty());
    }

    #[test]
    fn test_token_paste_elision() {
        let (out, _) = subst("(a)", vec!["bus"], "a``_en");
        assert_eq!(out, "bus_en");
    }

    #[test]
    fn test_quote_escapes() {
        let (out, _) = subst("(a)", vec!["hello"], "`\"a`\"");
        assert_eq!(out, "\"hello\"");
        let (out, _) = subst("(a)", vec!["x"], "`\\a");
        assert_eq!(out, "\\x");
    }

    #[test]
    fn test_backslash_pairs_are_literal() {
        let (out, _) = subst("(a)", vec!["x"], "\\a b");
        assert_eq!(out, "\\a b");
    }

    #[test]
    fn test_no_substitution_inside_strings() {
        let (out, _) = subst("(a)", vec!["1"], "\"a\" a");
        assert_eq!(out, "\"a\" 1");
    }

    #[test]
    fn test_dollar_identifiers() {
        let (out, _) = subst("(val)", vec!["9"], "$display(val)");
        assert_eq!(out, "$display(9)");
        let (out, _) = subst("(a$b)", vec!["7"], "a$b+1");
        assert_eq!(out, "7+1");
    }

    #[test]
    fn test_pure_function() {
        let first = subst("(a,b=2)", vec!["1"], "a+b").0;
        let second = subst("(a,b=2)", vec!["1"], "a+b").0;
        assert_eq!(first, second);
    }

    #[test]
    fn test_nested_formal_defaults() {
        let (out, errors) = subst("(a={1,2}, b=(3,4))", vec![], "a:b");
        assert_eq!(out, "{1,2}:(3,4)");
        assert!(errors.is_empty());
    }

}
