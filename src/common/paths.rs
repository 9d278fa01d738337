// locations the web layer redirects to

pub fn profile(username: &str) -> String {
	format!("/profile/{}/", urlencoding::encode(username))
}

pub fn post_detail(post_id: i64) -> String {
	format!("/posts/{post_id}/")
}

#[test]
fn test_paths() {
	assert_eq!(profile("auth"), "/profile/auth/");
	assert_eq!(profile("a b"), "/profile/a%20b/");
	assert_eq!(post_detail(3), "/posts/3/");
}
