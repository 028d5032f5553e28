/*!

This is the long-form manual for `precinct_tally` and `tallymap`.

## Input layout

`tallymap` reads a source directory with one directory per election, and inside
each election one directory per result set (a snapshot of the count at one point
in time):

```text
rawdata/
  10/
    1/
      summary_10.xml
      precincts_10.csv
    2/
      summary_10.xml
      precincts_10.csv
```

The same structure can be given explicitly in a JSON configuration file, which
also carries the display names of the elections:

```json
{
  "outputSettings": { "outputDirectory": "data", "legacyKeys": false },
  "elections": [
    {
      "electionId": "10",
      "name": "November 3, 2020 General",
      "results": [
        { "resultId": "1", "summaryPath": "rawdata/10/1/summary_10.xml", "precinctsPath": "rawdata/10/1/precincts_10.csv" }
      ]
    }
  ]
}
```

Instead of `elections`, a configuration may point to a `sourceDirectory` and
provide `electionNames` (a map from election id to display name).
Paths are relative to the configuration file.

### `summary_<election>.xml`

Only the content of the first `GeneratedDate` element is used. It is the time
of the snapshot. Accepted forms:
- `2020-11-03T20:11:35-08:00` (with offset)
- `2020-11-03T20:11:35` or `2020-11-03 20:11:35` (read as UTC)
- `11/03/2020 08:11:35 PM` (read as UTC)

### `precincts_<election>.csv`

The first line is decorative and is always dropped. The second line is the
header, which must contain the columns `Contest Name`, `Precinct`,
`Candidate Name` and `Votes` (in any order, other columns are ignored).

The precinct is a compound code `<4 digits>-<6 digits>-<consolidation>`, for
example `1234-567890-DOWNTOWN`. The vote-by-mail variant of a consolidation
contains `-VBM` (usually at the end). The marker is removed and the precinct is
merged with its in-person counterpart.

A vote count that is not a non-negative integer, or a precinct code that does
not follow this shape, rejects the whole result set: nothing is published for it.
The other result sets are still published.

## Published files

All the files are written in a single output directory:

| file | content |
|------|---------|
| `metadata.json` | elections and their result sets, newest first |
| `<election>_contests.json` | the names of the contests, sorted |
| `<election>_<result>.json` | every normalized row of the result set |
| `<election>_<result>_<contest key>.json` | `createdAt`, candidate `summary` and precinct `results` for one contest |
| `<election>_<contest key>_series.json` | the totals of one contest for each result set, oldest first |

The contest key is the hexadecimal encoding of the UTF-8 bytes of the contest
name, which cannot collide and can be decoded back. Names longer than 48 bytes
are keyed by the hex of their first 16 bytes, a dash and the hex of their
SHA-256 digest. With `legacyKeys` (or
`--legacy-keys`) the file name is instead percent-encoded and stripped of its
`%` characters, as expected by older viewers. Two contests with the same legacy
key, in the same result set or in an earlier result set of the election, make
the later result set fail. A result set whose files cannot be written is
reported as failed, and the other ones are still published.

## Checking a build

`--reference <directory>` compares every generated file with the file of the
same name in a previously published directory and prints the differences.

 */
