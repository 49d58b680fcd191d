use super::*;

#[test]
fn test_cli_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}

#[test]
fn test_status_and_track_take_page() {
    let cli = Cli::try_parse_from(["halo", "status", "--page", "/shorts/abc", "--json"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Status { ref page, json: true } if page == "/shorts/abc"
    ));

    let cli = Cli::try_parse_from(["halo", "track", "--page", "/watch"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Track { ref host, ref page } if host == "www.youtube.com" && page == "/watch"
    ));

    assert!(Cli::try_parse_from(["halo", "status", "--path", "/"]).is_err());
}
