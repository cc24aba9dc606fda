//! Welcome banner.

const VERSION: &str = env!("CARGO_PKG_VERSION");

const GOPHER: &str = r#"+--------------------+
| Was that XML raw?  |
+--------------------+
  \
   \
    \
         ,_---~~~~~----._
  _,,_,*^____      _____``*g*"*,
 / __/ /'     ^.  /      \ ^@q   f
[  @f | @))    |  | @))   l  0 _/
 \`/   \~____ / __ \_____/    \
 |           _l__l_           I
 }          [______]           I
 ]            | | |            |
 ]             ~ ~             |
 |                            |
  |                           |"#;

/// The full welcome banner text.
pub fn render() -> String {
    format!(
        "\nWelcome to the Gopher Hole v{VERSION}!\n\n\
         Throw your XML into the hole, and the Gophers will toss back JSON!\n\n\
         {GOPHER}\n\n\
         Developed by Christian Westbrook\n\
         https://github.com/christian-westbrook/\n\n\
         Artwork by belbomemo\n\
         https://gist.github.com/belbomemo\n"
    )
}

/// Print the welcome banner to stderr.
pub fn print() {
    eprintln!("{}", render());
}
