// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Detection rule table: per-language patterns, keywords, extensions.
//!
//! This is policy data, not engine logic. Each pattern carries a short
//! description used in the finding's reason text.

/// Rules for one detectable language.
pub struct LanguageRules {
    pub language: &'static str,
    /// (regex, description) pairs; each match counts double
    pub patterns: &'static [(&'static str, &'static str)],
    /// Whole-word keywords; each occurrence counts once
    pub keywords: &'static [&'static str],
    /// Extensions that boost confidence when the content agrees
    pub extensions: &'static [&'static str],
}

pub const RULES: &[LanguageRules] = &[
    LanguageRules {
        language: "python",
        patterns: &[
            (r"def\s+\w+\s*\([^)]*\)\s*:", "function definition"),
            (r"class\s+\w+\s*(\([^)]*\))?\s*:", "class definition"),
            (r"import\s+[\w.]+", "import statement"),
            (r"from\s+[\w.]+\s+import", "from-import statement"),
            (r#"if\s+__name__\s*==\s*["']__main__["']"#, "main guard"),
            (r"@\w+", "decorator"),
            (r"(print|input)\s*\(", "built-in function"),
            (r"#\s*.*\n", "python comment"),
            (r#""""[\s\S]*?"""|'''[\s\S]*?'''"#, "docstring"),
        ],
        keywords: &[
            "def", "class", "import", "from", "if", "else", "elif", "for", "while", "try",
            "except", "finally", "with", "return", "yield", "lambda", "pass", "break",
            "continue", "True", "False", "None", "and", "or", "not", "in", "is",
        ],
        extensions: &[".py", ".pyw", ".pyc", ".pyo"],
    },
    LanguageRules {
        language: "matlab",
        patterns: &[
            (r"function\s+.*=.*\([^)]*\)", "function definition"),
            (r"\bend\b", "end keyword"),
            (r"%[^\n]*", "matlab comment"),
            (r"fprintf\s*\(", "fprintf call"),
            (r"disp\s*\(", "disp call"),
            (r"plot\s*\(", "plot call"),
            (r"clc\s*;?", "clear command"),
            (r"clear\s+(all|variables)?", "clear command"),
            (r"figure\s*(\(\d+\))?", "figure command"),
        ],
        keywords: &[
            "function", "end", "if", "else", "elseif", "for", "while", "return", "fprintf",
            "disp", "plot", "figure", "hold", "clc", "clear", "load", "save", "input",
        ],
        extensions: &[".m", ".mat", ".fig"],
    },
    LanguageRules {
        language: "c",
        patterns: &[
            (r"#include\s*<[^>]+>", "include directive"),
            (r#"#include\s*"[^"]+""#, "local include"),
            (r"#define\s+\w+", "define directive"),
            (r"int\s+main\s*\([^)]*\)", "main function"),
            (r"\w+\s*\*?\s*\w+\s*\([^)]*\)\s*\{", "function definition"),
            (r"printf\s*\(", "printf call"),
            (r"malloc\s*\(|free\s*\(", "heap management"),
            (r"struct\s+\w+\s*\{", "struct definition"),
            (r"typedef\s+", "typedef"),
            (r"/\*[\s\S]*?\*/", "block comment"),
        ],
        keywords: &[
            "int", "char", "void", "float", "double", "long", "short", "unsigned", "signed",
            "struct", "union", "enum", "typedef", "static", "const", "extern", "sizeof",
            "return", "if", "else", "for", "while", "switch", "case", "break", "continue",
        ],
        extensions: &[".c", ".h"],
    },
    LanguageRules {
        language: "cpp",
        patterns: &[
            (r"#include\s*<[^>]+>", "include directive"),
            (r"using\s+namespace\s+\w+", "using directive"),
            (r"std::\w+", "std qualifier"),
            (r"class\s+\w+\s*(:\s*\w+\s+\w+)?\s*\{", "class definition"),
            (r"template\s*<[^>]*>", "template"),
            (r"\w+::\w+\s*\([^)]*\)", "scoped function"),
            (r"cout\s*<<|cin\s*>>", "stream io"),
            (r"new\s+\w+|delete\s+\w+", "heap management"),
            (r"//[^\n]*", "single-line comment"),
            (r"/\*[\s\S]*?\*/", "block comment"),
        ],
        keywords: &[
            "class", "public", "private", "protected", "virtual", "override", "template",
            "typename", "namespace", "using", "new", "delete", "nullptr", "auto", "const",
            "static", "return", "if", "else", "for", "while", "switch", "case", "try",
            "catch", "throw",
        ],
        extensions: &[".cpp", ".cc", ".cxx", ".hpp", ".hh"],
    },
    LanguageRules {
        language: "java",
        patterns: &[
            (r"public\s+class\s+\w+", "class definition"),
            (r"private\s+class\s+\w+", "class definition"),
            (r"public\s+static\s+void\s+main", "main method"),
            (r"public\s+\w+\s+\w+\s*\([^)]*\)", "method definition"),
            (r"private\s+\w+\s+\w+\s*\([^)]*\)", "method definition"),
            (r"import\s+[\w.]+;", "import statement"),
            (r"package\s+[\w.]+;", "package statement"),
            (r"new\s+\w+\s*\(", "object creation"),
            (r"@Override", "annotation"),
            (r"System\.out\.print", "print statement"),
            (r"//[^\n]*", "single-line comment"),
            (r"/\*[\s\S]*?\*/", "multi-line comment"),
        ],
        keywords: &[
            "public", "private", "protected", "class", "interface", "extends", "implements",
            "void", "int", "String", "boolean", "double", "if", "else", "for", "while",
            "switch", "case", "return", "new", "this", "super", "static", "final",
            "abstract", "try", "catch", "throw", "throws", "import", "package",
        ],
        extensions: &[".java", ".class", ".jar"],
    },
];
