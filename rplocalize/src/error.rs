use thiserror::Error;


/// Errors from the reversible path codec (§4.1).
#[ derive( Debug, Error ) ]
pub enum PathError {
    #[ error( "path \"{0}\" resolves to nothing" ) ]
    NotFound( String ),

    #[ error( "segment \"{segment}\" in path \"{path}\" is not a valid index" ) ]
    BadIndex { path: String, segment: String },

    #[ error( "value at \"{0}\" is not a container that can be descended into" ) ]
    NotContainer( String ),
}


/// Errors from the JSON extractor/injector (§4.5).
#[ derive( Debug, Error ) ]
pub enum JsonCoreError {
    #[ error( "failed to parse JSON" ) ]
    Parse( #[ from ] serde_json::Error ),

    #[ error( "plugins.js prelude is missing \"var $plugins =\"" ) ]
    NoPluginsPrelude,

    #[ error( "plugins.js JSON literal is not balanced" ) ]
    UnbalancedPluginsLiteral,

    #[ error( transparent ) ]
    Path( #[ from ] PathError ),

    #[ error( "io error" ) ]
    Io( #[ from ] std::io::Error ),
}


/// Errors from the Ruby Marshal extractor/injector (§4.6).
#[ derive( Debug, Error ) ]
pub enum MarshalError {
    #[ error( "failed to load Marshal data" ) ]
    Load( String ),

    #[ error( "failed to dump Marshal data" ) ]
    Dump( String ),

    #[ error( "zlib decompression failed" ) ]
    Zlib( #[ from ] std::io::Error ),

    #[ error( "Scripts entry is not a well-formed [id, name, code] triple" ) ]
    MalformedScriptEntry,

    #[ error( "recursion depth exceeded {0}" ) ]
    TooDeep( usize ),

    #[ error( transparent ) ]
    Path( #[ from ] PathError ),
}


/// Errors that can arise resolving a translated batch back to its
/// source lines. The merger otherwise never fails: a
/// count mismatch is reported as data (`SplitOutcome::mismatch`), not
/// as an error variant, since the pipeline must recover from it.
#[ derive( Debug, Error ) ]
pub enum MergeError {
    #[ error( "batch is empty, nothing to split" ) ]
    EmptyBatch,
}

/// Errors surfaced by the pipeline orchestrator (§4.8/§11). Per-file
/// failures are logged and downgraded to a skip rather than returned
/// here; this enum is for failures that abort the whole run.
#[ derive( Debug, Error ) ]
pub enum PipelineError {
    #[ error( "project directory \"{0}\" does not exist or is not a directory" ) ]
    InvalidProjectDir( String ),

    #[ error( "failed to discover files under \"{0}\"" ) ]
    Discovery( String ),

    #[ error( "io error" ) ]
    Io( #[ from ] std::io::Error ),
}

/// Top-level error composed at the pipeline boundary (§11).
#[ derive( Debug, Error ) ]
pub enum CoreError {
    #[ error( "JSON core error" ) ]
    Json( #[ from ] JsonCoreError ),

    #[ error( "Marshal core error" ) ]
    Marshal( #[ from ] MarshalError ),

    #[ error( "merge error" ) ]
    Merge( #[ from ] MergeError ),

    #[ error( "pipeline error" ) ]
    Pipeline( #[ from ] PipelineError ),

    #[ error( "io error" ) ]
    Io( #[ from ] std::io::Error ),
}
