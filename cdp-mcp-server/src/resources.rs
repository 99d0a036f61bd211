//! MCP Resources for the CDP server.
//!
//! Two read-only markdown documents:
//! - `cdp://workflow` - the list / usage / data file / execute loop
//! - `cdp://quickstart` - ready-made command arrays for common jobs

/// MIME type of every resource served here.
pub const MARKDOWN_MIME: &str = "text/markdown";

pub const WORKFLOW_URI: &str = "cdp://workflow";
pub const QUICKSTART_URI: &str = "cdp://quickstart";

/// A static document exposed as an MCP resource.
#[derive(Debug, Clone, Copy)]
pub struct Document {
    pub uri: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub body: &'static str,
}

/// Every resource, in listing order.
pub const DOCUMENTS: &[Document] = &[
    Document {
        uri: WORKFLOW_URI,
        name: "CDP Workflow Guide",
        description: "How to go from a program name to a finished sound with the CDP tools",
        body: WORKFLOW_GUIDE,
    },
    Document {
        uri: QUICKSTART_URI,
        name: "CDP Quick Start",
        description: "Command arrays for common CDP operations",
        body: QUICKSTART,
    },
];

/// Look up a document by URI.
pub fn find(uri: &str) -> Option<&'static Document> {
    DOCUMENTS.iter().find(|doc| doc.uri == uri)
}

const WORKFLOW_GUIDE: &str = r#"# CDP Workflow

The server never interprets CDP syntax. You read the program's own usage text
and build the exact argument list yourself.

## 1. Find a program

```
list_cdp_programs()
```

Programs come back grouped under Spectral Processing, Time Domain, Synthesis,
Analysis and Utility, and Other.

## 2. Read its usage

```
get_cdp_usage("blur")
get_cdp_usage("modify", "brassage")
```

`usage_text` is whatever the program printed when run bare. The response also
flags whether the text lists modes or flags, and adds a `note` when the
program repeats its name as the first argument (`blur blur ...`).

## 3. Write data files when asked for one

Some programs read parameters from a text file (breakpoint tables, note lists,
time lists). Create it first:

```
create_data_file("times.txt", "0.0\n1.5\n3.2")
```

Relative paths are placed in the scratch directory, which is also the working
directory of every CDP process.

## 4. Run the command

```
execute_cdp(["blur", "blur", "input.ana", "output.ana", "50"])
```

## Reading the result

CDP exit codes are unreliable. A run is reported as `success` when:

- the exit code is 0, or
- the exit code is 1 with output on stdout and nothing on stderr, or
- the last argument (not a flag) names a file that exists after the run.

The `verdict` field says which rule applied. Check `stderr` whenever the
status is `failed`.

## Spectral files

Most spectral programs work on `.ana` files. Convert a sound first:

```
prepare_spectral("input.wav", "input.ana")
```

and resynthesize with `pvoc synth` when done.

## Argument shapes

```
[program, mode, infile, outfile, params...]
[program, subprogram, mode, infile, outfile, params...]
[program, mode, infile, outfile, -flag, value]
```
"#;

const QUICKSTART: &str = r#"# CDP Quick Start

## Three calls

```
list_cdp_programs()
get_cdp_usage("modify", "speed")
execute_cdp(["modify", "speed", "1", "input.wav", "output.wav", "2.0"])
```

## Common jobs

### Analyse a sound into a spectrum
```
execute_cdp(["pvoc", "anal", "1", "input.wav", "input.ana"])
```

### Resynthesize a spectrum
```
execute_cdp(["pvoc", "synth", "input.ana", "output.wav"])
```

### Time stretch
```
execute_cdp(["stretch", "time", "1", "input.ana", "output.ana", "2.0"])
```

### Spectral blur (double syntax)
```
execute_cdp(["blur", "blur", "input.ana", "output.ana", "50"])
```

### Granular texture
```
execute_cdp(["modify", "brassage", "4", "input.wav", "output.wav", "0.02", "-0.5", "-r200"])
```

### Stereo to mono
```
execute_cdp(["housekeep", "chans", "4", "stereo.wav", "mono.wav"])
```

### Check the result
```
analyze_sound("output.wav")
```

## When something fails

- Run `get_cdp_usage` again and compare argument counts.
- Spectral programs need `.ana` input, time-domain programs need sound files.
- Mode numbers start at 1.
"#;
