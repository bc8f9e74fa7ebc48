// Copyright (c) 2021, BlockProject 3D
//
// All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
//     * Redistributions of source code must retain the above copyright notice,
//       this list of conditions and the following disclaimer.
//     * Redistributions in binary form must reproduce the above copyright notice,
//       this list of conditions and the following disclaimer in the documentation
//       and/or other materials provided with the distribution.
//     * Neither the name of BlockProject 3D nor the names of its contributors
//       may be used to endorse or promote products derived from this software
//       without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS
// "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT
// LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR
// A PARTICULAR PURPOSE ARE DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT OWNER OR
// CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL,
// EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO,
// PROCUREMENT OF SUBSTITUTE GOODS OR SERVICES; LOSS OF USE, DATA, OR
// PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF
// LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING
// NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE OF THIS
// SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! Slash-separated logical path arithmetic.
//!
//! Preset and shader paths are keys into a host loader, not OS paths, so
//! they use `/` regardless of platform.

/// Returns the directory component of `path`, without a trailing slash.
pub fn parent_dir(path: &str) -> &str
{
    match path.rfind('/') {
        Some(pos) => &path[..pos],
        None => ""
    }
}

/// Joins `rel` onto `base_dir` and collapses `.` and `..` segments.
pub fn resolve_relative(base_dir: &str, rel: &str) -> String
{
    let mut segments: Vec<&str> = Vec::new();
    if !base_dir.is_empty() {
        segments.extend(base_dir.split('/'));
    }
    for seg in rel.split('/') {
        match seg {
            "" | "." => (),
            ".." => {
                if segments.is_empty() || segments.last() == Some(&"..") {
                    segments.push("..");
                } else {
                    segments.pop();
                }
            },
            other => segments.push(other)
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod test
{
    use super::*;

    #[test]
    fn parent()
    {
        assert_eq!(parent_dir("shaders/base/root.slangp"), "shaders/base");
        assert_eq!(parent_dir("root.slangp"), "");
    }

    #[test]
    fn join_simple()
    {
        assert_eq!(resolve_relative("shaders/base", "a.inc"), "shaders/base/a.inc");
    }

    #[test]
    fn join_up()
    {
        assert_eq!(
            resolve_relative("shaders/base", "../common/a.inc"),
            "shaders/common/a.inc"
        );
        assert_eq!(resolve_relative("a", "../../b"), "../b");
    }

    #[test]
    fn join_dot()
    {
        assert_eq!(resolve_relative("x", "./y/./z"), "x/y/z");
    }

    #[test]
    fn join_from_root()
    {
        assert_eq!(resolve_relative("", "y/z"), "y/z");
    }
}
